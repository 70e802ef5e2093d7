use crate::model::{Customer, Keyword, Order, Shared};
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct MetricRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
pub struct CustomerRow {
    #[tabled(rename = "Nr")]
    pub nr: i64,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Ort")]
    pub ort: String,
}

#[derive(Tabled)]
pub struct OrderRow {
    #[tabled(rename = "Nr")]
    pub nr: i64,
    #[tabled(rename = "Datum")]
    pub datum: String,
    #[tabled(rename = "Customer")]
    pub customer: String,
    #[tabled(rename = "Positions")]
    pub positions: usize,
    #[tabled(rename = "Total")]
    pub total: String,
    #[tabled(rename = "Tags")]
    pub tags: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

#[derive(Tabled)]
pub struct KeywordRow {
    #[tabled(rename = "Uuid")]
    pub uuid: String,
    #[tabled(rename = "Text")]
    pub text: String,
}

impl From<&Customer> for CustomerRow {
    fn from(c: &Customer) -> Self {
        Self {
            nr: c.nr,
            name: c.name.clone(),
            ort: c.ort.clone(),
        }
    }
}

impl From<&Order> for OrderRow {
    fn from(o: &Order) -> Self {
        let customer = match o.customer() {
            Some(customer) => {
                let customer = customer.borrow();
                format!("{} {}", customer.nr, customer.name)
            }
            None if o.auftraggeber() == -1 => "-".to_string(),
            None => format!("{} ({})", o.auftraggeber(), o.customer_ref().status()),
        };
        let total: rust_decimal::Decimal = o.positions().iter().map(|p| p.preis).sum();
        let tags = o
            .tags()
            .iter()
            .map(|k| k.borrow().text.clone())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            nr: o.nr(),
            datum: o.datum.map(|d| d.to_string()).unwrap_or_default(),
            customer,
            positions: o.position_count(),
            total: total.round_dp(2).to_string(),
            tags,
            status: if o.is_all_resolved() { "resolved" } else { "pending" }.to_string(),
        }
    }
}

impl From<&Keyword> for KeywordRow {
    fn from(k: &Keyword) -> Self {
        Self {
            uuid: k.uuid.clone(),
            text: k.text.clone(),
        }
    }
}

fn render<R: Tabled>(rows: &[R]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn customer_table(customers: &[Shared<Customer>]) -> String {
    let rows: Vec<CustomerRow> = customers.iter().map(|c| CustomerRow::from(&*c.borrow())).collect();
    render(&rows)
}

pub fn order_table(orders: &[Shared<Order>]) -> String {
    let rows: Vec<OrderRow> = orders.iter().map(|o| OrderRow::from(&*o.borrow())).collect();
    render(&rows)
}

pub fn keyword_table(keywords: &[Shared<Keyword>]) -> String {
    let rows: Vec<KeywordRow> = keywords.iter().map(|k| KeywordRow::from(&*k.borrow())).collect();
    render(&rows)
}

pub fn stats_table(stats: &[(&str, String)]) -> String {
    let rows: Vec<MetricRow> = stats
        .iter()
        .map(|(label, value)| MetricRow {
            metric: label.to_string(),
            value: value.clone(),
        })
        .collect();
    render(&rows)
}
