use crate::{emit_success, OutputMode};
use anyhow::Context;
use ordercache::config::{self, OrdercacheConfig};
use ordercache::ui::{self, Icons};
use ordercache::{EntityKind, EntityStore, RefStatus, View};
use std::path::Path;
use std::time::Instant;

fn resolve_config(path: Option<&Path>) -> anyhow::Result<OrdercacheConfig> {
    let shown = path.map(Path::to_path_buf).unwrap_or_else(config::default_config_path);
    let config = config::load_config(path)
        .with_context(|| format!("failed to read config {}", shown.display()))?;
    Ok(config.unwrap_or_default())
}

/// Open the store and run its startup load
fn open_store(config: &OrdercacheConfig) -> anyhow::Result<(EntityStore, ordercache::ResolveStats)> {
    config::ensure_data_dir(config)?;
    let mut store = EntityStore::open(config);
    let stats = store.init().context("failed to load caches")?;
    Ok((store, stats))
}

pub fn run_init(mode: OutputMode, path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config::default_config_path);
    let config = OrdercacheConfig::with_defaults();
    config::write_config(&path, &config, force)?;
    config::ensure_data_dir(&config)?;

    if mode.is_human() {
        ui::done(&format!("Wrote {}", path.display()));
        ui::summary_row("data dir:", &config.data_dir().display().to_string());
        ui::summary_row("assets dir:", &config.assets_dir().display().to_string());
        ui::summary_row("database:", &config.database_path().display().to_string());
    }
    emit_success(mode, "init", serde_json::to_value(&config)?)
}

pub fn run_stats(mode: OutputMode, path: Option<&Path>) -> anyhow::Result<()> {
    let config = resolve_config(path)?;
    let (store, _) = open_store(&config)?;
    let stats = store.stats();
    let sql_rows = match store.sql() {
        Some(sql) => Some(sql.count_customers()?),
        None => None,
    };

    if mode.is_human() {
        ui::section(Icons::STATS, "Store Statistics");
        let rows = [
            ("Customers", stats.customers.to_string()),
            ("Orders", stats.orders.to_string()),
            ("Positions", stats.positions.to_string()),
            ("Keywords", stats.keywords.to_string()),
            ("Unresolved orders", stats.unresolved_orders.to_string()),
            ("Invalid orders", stats.invalid_orders.to_string()),
            (
                "SQLite customers",
                sql_rows.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
            ),
            ("Customer source", store.customer_source().to_string()),
        ];
        println!("{}", ui::stats_table(&rows));
    }
    let mut data = serde_json::to_value(&stats)?;
    data["sql_customers"] = serde_json::json!(sql_rows);
    emit_success(mode, "stats", data)
}

pub fn run_import_customers(mode: OutputMode, path: Option<&Path>, chunk_size: Option<usize>) -> anyhow::Result<()> {
    let mut config = resolve_config(path)?;
    if chunk_size.is_some() {
        config.chunk_size = chunk_size;
    }
    config::ensure_data_dir(&config)?;

    let mut store = EntityStore::open(&config);
    store.load_customers().context("failed to load customer snapshot")?;

    let started = Instant::now();
    let report = store.import_customers_to_sql()?;

    if mode.is_human() {
        ui::section(Icons::DATABASE, "Customer Import");
        ui::summary_row("rows:", &report.rows.to_string());
        ui::summary_row("chunks:", &report.chunks.to_string());
        ui::timing(started.elapsed());
        ui::done(&format!("Imported into {}", config.database_path().display()));
    }
    emit_success(mode, "import-customers", serde_json::to_value(report)?)
}

pub fn run_resolve(mode: OutputMode, path: Option<&Path>, order: Option<i64>, save: bool) -> anyhow::Result<()> {
    let config = resolve_config(path)?;
    let (store, init_stats) = open_store(&config)?;

    // init already resolved everything; a single order is re-reported on request
    let stats = match order {
        Some(nr) => store.resolve_order_references(nr)?,
        None => init_stats,
    };

    if mode.is_human() {
        ui::section(Icons::LINK, "Reference Resolution");
        print!("{}", stats);
        let unresolved: Vec<String> = store
            .orders()
            .iter()
            .filter_map(|o| {
                let order = o.borrow();
                let status = if order.customer_ref().is_invalid() {
                    RefStatus::Invalid
                } else if !order.is_all_resolved() {
                    RefStatus::Pending
                } else {
                    return None;
                };
                Some(ui::status_ref(EntityKind::Order, &order.nr().to_string(), status))
            })
            .collect();
        if !unresolved.is_empty() {
            ui::caution(&format!("Orders with missing references: {}", unresolved.join(", ")));
        }
    }

    if save {
        store.finish()?;
        if mode.is_human() {
            ui::snapshot_written(&store.snapshots().path_for(EntityKind::Customer)?);
            ui::snapshot_written(&store.snapshots().path_for(EntityKind::Order)?);
        }
    }
    emit_success(mode, "resolve", serde_json::to_value(&stats)?)
}

pub fn run_export(path: Option<&Path>, kind: EntityKind, view: View) -> anyhow::Result<()> {
    let config = resolve_config(path)?;
    let (store, _) = open_store(&config)?;
    let records = store.records(kind, view)?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

pub fn run_list(mode: OutputMode, path: Option<&Path>, kind: EntityKind) -> anyhow::Result<()> {
    let config = resolve_config(path)?;
    let (store, _) = open_store(&config)?;

    if mode.is_human() {
        let (icon, table) = match kind {
            EntityKind::Customer => (Icons::PERSON, ui::customer_table(store.customers())),
            EntityKind::Order => (Icons::ORDER, ui::order_table(store.orders())),
            EntityKind::Keyword => (Icons::TAG, ui::keyword_table(store.keywords())),
            EntityKind::Position => anyhow::bail!("positions are listed with their orders"),
        };
        ui::section(icon, &format!("{}s", kind));
        if table.is_empty() {
            ui::empty_listing(kind);
        } else {
            println!("{}", table);
        }
    }
    emit_success(mode, "list", serde_json::json!(store.records(kind, View::Full)?))
}
