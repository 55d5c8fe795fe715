//! Dashboard, monthly resume and category listing.

use crate::aggregate::{self, CategoryAggregate, HighlightSummary, MonthFilter};
use crate::commands::{signed_in_user, Out};
use crate::error::{ErrorType, IntoResult};
use crate::format;
use crate::model::{CategoryDefinition, CATEGORIES};
use crate::{Config, Result};
use rust_decimal::Decimal;
use serde::Serialize;

/// The dashboard: the highlight cards plus their display strings.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Dashboard {
    pub user_name: String,
    pub summary: HighlightSummary,
    pub entries: String,
    pub entries_caption: String,
    pub expenses: String,
    pub expenses_caption: String,
    pub total: String,
    pub total_caption: String,
}

impl Dashboard {
    fn new(user_name: &str, summary: HighlightSummary) -> Self {
        Self {
            user_name: user_name.to_string(),
            entries: format::currency(summary.entries_total),
            entries_caption: summary.entries_caption(),
            expenses: format::currency(summary.expenses_total),
            expenses_caption: summary.expenses_caption(),
            total: format::currency(summary.net_total),
            total_caption: summary.interval_label.clone(),
            summary,
        }
    }

    fn message(&self) -> String {
        format!(
            "Olá, {}\n\
            Entradas  {:>16}  {}\n\
            Saídas    {:>16}  {}\n\
            Total     {:>16}  {}",
            self.user_name,
            self.entries,
            self.entries_caption,
            self.expenses,
            self.expenses_caption,
            self.total,
            self.total_caption,
        )
    }
}

/// Computes the dashboard of the signed-in user over all of their transactions.
pub async fn dashboard(config: &Config) -> Result<Out<Dashboard>> {
    let user = signed_in_user(config).await?;
    let records = config
        .transactions()
        .load(&user)
        .await
        .pub_result(ErrorType::Storage)?;
    let dashboard = Dashboard::new(user.name(), aggregate::highlights(&records));
    Ok(Out::new(dashboard.message(), dashboard))
}

/// The expenses of one month by category.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Resume {
    pub month: MonthFilter,
    /// e.g. `junho, 2021`
    pub month_label: String,
    pub expenses_total: Decimal,
    pub categories: Vec<CategoryAggregate>,
}

impl Resume {
    fn message(&self) -> String {
        let mut message = format!("Resumo por categoria\n< {} >", self.month_label);
        if self.categories.is_empty() {
            message.push('\n');
            message.push_str(aggregate::NO_TRANSACTIONS);
        }
        for c in &self.categories {
            message.push_str(&format!(
                "\n{:<12} {:>16} {:>5}",
                c.name,
                c.total_formatted(),
                c.percent_label()
            ));
        }
        message
    }
}

/// Computes the category breakdown of the signed-in user's expenses in `month`.
pub async fn resume(config: &Config, month: MonthFilter) -> Result<Out<Resume>> {
    let user = signed_in_user(config).await?;
    let records = config
        .transactions()
        .load(&user)
        .await
        .pub_result(ErrorType::Storage)?;
    let categories = aggregate::by_category(&records, month);
    let resume = Resume {
        month,
        month_label: month.to_string(),
        expenses_total: aggregate::month_expenses(&records, month),
        categories,
    };
    Ok(Out::new(resume.message(), resume))
}

/// Lists the fixed category table.
pub fn categories() -> Out<Vec<CategoryDefinition>> {
    let mut message = String::from("Categorias");
    for c in CATEGORIES {
        message.push_str(&format!("\n{:<10} {:<12} {} {}", c.key, c.name, c.color, c.icon));
    }
    Out::new(message, CATEGORIES.to_vec())
}
