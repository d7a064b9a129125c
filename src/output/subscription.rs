use crate::store::{BillingCycle, Category, SubscriptionRecord};
use serde_json::json;

/// Placeholder rendered when a sealed field does not decrypt to text —
/// locked session, wrong key, or stale ciphertext.
pub const LOCKED_PLACEHOLDER: &str = "Locked Data";

fn name_or_placeholder(name: &str) -> &str {
    if name.is_empty() { LOCKED_PLACEHOLDER } else { name }
}

pub fn subscription_summary_text(record: &SubscriptionRecord, name: &str, amount: &str) -> String {
    format!(
        "{}\t{}\t{}{}\t{}\t{}",
        record.id,
        name_or_placeholder(name),
        record.currency.symbol(),
        if amount.is_empty() { "0" } else { amount },
        billing_cycle_str(record.billing_cycle),
        record.next_billing,
    )
}

pub fn subscription_summary_json(
    record: &SubscriptionRecord,
    name: &str,
    amount: &str,
) -> serde_json::Value {
    json!({
        "id": record.id.to_string(),
        "name": name_or_placeholder(name),
        "amount": if amount.is_empty() { "0" } else { amount },
        "currency": record.currency.symbol(),
        "billing_cycle": billing_cycle_str(record.billing_cycle),
        "next_billing": record.next_billing.as_str(),
        "auto_renew": record.auto_renew,
        "is_trial": record.is_trial,
        "category": category_str(record.category),
        "created_at": record.created_at,
        "updated_at": record.updated_at,
    })
}

pub fn billing_cycle_str(cycle: BillingCycle) -> &'static str {
    match cycle {
        BillingCycle::Weekly => "weekly",
        BillingCycle::Monthly => "monthly",
        BillingCycle::Yearly => "yearly",
    }
}

pub fn category_str(category: Category) -> &'static str {
    match category {
        Category::Entertainment => "entertainment",
        Category::Bills => "bills",
        Category::Work => "work",
        Category::Lifestyle => "lifestyle",
        Category::Other => "other",
    }
}
