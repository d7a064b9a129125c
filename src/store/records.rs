use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Inr,
}

impl Currency {
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Inr => "₹",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BillingCycle {
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Entertainment,
    Bills,
    Work,
    Lifestyle,
    Other,
}

/// The per-user record held by the backing store.
///
/// `vault_check` is the verification token: a one-way digest of the derived
/// key, safe to persist, and the sole unlock gate. `monthly_income_enc` is an
/// opaque sealed-field string. Neither is meaningful without the key the
/// session holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_check: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_income_enc: Option<String>,
}

/// One tracked subscription. `name_enc` and `amount_enc` are sealed-field
/// strings; everything else is plaintext metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    #[serde(with = "uuid_as_string")]
    pub id: Uuid,
    pub name_enc: String,
    pub amount_enc: String,
    pub currency: Currency,
    pub billing_cycle: BillingCycle,
    /// ISO date string, e.g. `2026-09-01`.
    pub next_billing: String,
    pub auto_renew: bool,
    pub is_trial: bool,
    pub category: Category,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Partial update of the user record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub vault_check: Option<String>,
    pub monthly_income_enc: Option<String>,
}

/// Partial update of one subscription. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionPatch {
    pub name_enc: Option<String>,
    pub amount_enc: Option<String>,
    pub currency: Option<Currency>,
    pub billing_cycle: Option<BillingCycle>,
    pub next_billing: Option<String>,
    pub auto_renew: Option<bool>,
    pub is_trial: Option<bool>,
    pub category: Option<Category>,
    pub updated_at: Option<u64>,
}

impl SubscriptionRecord {
    pub fn apply(&mut self, patch: SubscriptionPatch) {
        if let Some(v) = patch.name_enc {
            self.name_enc = v;
        }
        if let Some(v) = patch.amount_enc {
            self.amount_enc = v;
        }
        if let Some(v) = patch.currency {
            self.currency = v;
        }
        if let Some(v) = patch.billing_cycle {
            self.billing_cycle = v;
        }
        if let Some(v) = patch.next_billing {
            self.next_billing = v;
        }
        if let Some(v) = patch.auto_renew {
            self.auto_renew = v;
        }
        if let Some(v) = patch.is_trial {
            self.is_trial = v;
        }
        if let Some(v) = patch.category {
            self.category = v;
        }
        if let Some(v) = patch.updated_at {
            self.updated_at = v;
        }
    }
}

impl UserRecord {
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(v) = patch.vault_check {
            self.vault_check = Some(v);
        }
        if let Some(v) = patch.monthly_income_enc {
            self.monthly_income_enc = Some(v);
        }
    }
}

pub mod uuid_as_string {
    use serde::{Deserialize, Deserializer, Serializer, de};
    use uuid::Uuid;

    pub fn serialize<S>(uuid: &Uuid, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&uuid.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Uuid, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Uuid::parse_str(&s).map_err(de::Error::custom)
    }
}
