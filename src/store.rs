use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    DashboardSummary, Profile, Registration, ReferralStats, RewardsAccount, SupportTicket,
    Transaction, TxnStatus,
};

const SEED: &str = include_str!("../data/seed.json");

#[derive(Debug, Deserialize)]
struct SeedData {
    registrations: Vec<Registration>,
    transactions: Vec<Transaction>,
    rewards: RewardsAccount,
    referrals: ReferralStats,
    profile: Profile,
}

/// In-memory data provider seeded at startup. The async surface mirrors the
/// request/response shape of the hosted API this dashboard fronts; everything
/// resolves immediately and dies with the process.
#[derive(Debug)]
pub struct DataStore {
    registrations: Vec<Registration>,
    transactions: Vec<Transaction>,
    rewards: RewardsAccount,
    referrals: ReferralStats,
    profile: Profile,
    tickets: Vec<SupportTicket>,
}

impl DataStore {
    pub fn new() -> Result<Self> {
        let seed: SeedData = serde_json::from_str(SEED)?;
        Ok(Self {
            registrations: seed.registrations,
            transactions: seed.transactions,
            rewards: seed.rewards,
            referrals: seed.referrals,
            profile: seed.profile,
            tickets: Vec::new(),
        })
    }

    pub async fn load_dashboard(&self) -> Result<DashboardSummary> {
        let active: Vec<&Registration> = self
            .registrations
            .iter()
            .filter(|r| r.status != TxnStatus::Completed)
            .collect();
        let monthly_outflow = active.iter().map(|r| r.amount).sum();
        let next_due = active
            .iter()
            .min_by_key(|r| r.next_due)
            .map(|r| (r.next_due, r.payee.clone()));

        Ok(DashboardSummary {
            active_registrations: active.len(),
            monthly_outflow,
            cash_points: self.rewards.balance,
            next_due,
        })
    }

    pub async fn load_registrations(&self) -> Result<Vec<Registration>> {
        Ok(self.registrations.clone())
    }

    pub async fn load_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.transactions.clone())
    }

    pub async fn load_rewards(&self) -> Result<RewardsAccount> {
        Ok(self.rewards.clone())
    }

    pub async fn load_referrals(&self) -> Result<ReferralStats> {
        Ok(self.referrals.clone())
    }

    pub async fn load_profile(&self) -> Result<Profile> {
        Ok(self.profile.clone())
    }

    pub async fn find_registration(&self, rg_id: &str) -> Result<Registration> {
        self.registrations
            .iter()
            .find(|r| r.id.eq_ignore_ascii_case(rg_id))
            .cloned()
            .ok_or_else(|| AppError::NotFound(rg_id.to_string()))
    }

    pub async fn update_tenant(&mut self, rg_id: &str, email: &str, phone: &str) -> Result<()> {
        validate_email(email)?;
        validate_phone(phone)?;
        let registration = self
            .registrations
            .iter_mut()
            .find(|r| r.id.eq_ignore_ascii_case(rg_id))
            .ok_or_else(|| AppError::NotFound(rg_id.to_string()))?;
        registration.tenant_email = email.to_string();
        registration.tenant_phone = phone.to_string();
        Ok(())
    }

    /// Deducts points from the balance and records the redemption. Returns
    /// the new balance.
    pub async fn redeem_points(&mut self, points: i64, today: NaiveDate) -> Result<i64> {
        if points <= 0 {
            return Err(AppError::Validation(
                "enter a positive number of points".into(),
            ));
        }
        if points % 100 != 0 {
            return Err(AppError::Validation(
                "points are redeemed in multiples of 100".into(),
            ));
        }
        if points > self.rewards.balance {
            return Err(AppError::Validation(format!(
                "only {} cash points available",
                self.rewards.balance
            )));
        }
        self.rewards.balance -= points;
        self.rewards.history.push(crate::models::Redemption {
            points,
            note: "Redeemed from dashboard".into(),
            date: today,
        });
        Ok(self.rewards.balance)
    }

    /// Files a support ticket and returns its generated reference.
    pub async fn submit_ticket(&mut self, subject: &str, message: &str) -> Result<String> {
        if subject.trim().is_empty() || message.trim().is_empty() {
            return Err(AppError::Validation(
                "subject and message are both required".into(),
            ));
        }
        let reference = format!("TKT-{}", &Uuid::new_v4().simple().to_string()[..8]);
        self.tickets.push(SupportTicket {
            reference: reference.clone(),
            subject: subject.trim().to_string(),
            message: message.trim().to_string(),
        });
        Ok(reference)
    }

    pub async fn save_profile(&mut self, profile: Profile) -> Result<()> {
        if profile.name.trim().is_empty() {
            return Err(AppError::Validation("name is required".into()));
        }
        validate_email(&profile.email)?;
        validate_phone(&profile.phone)?;
        self.profile = profile;
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<()> {
    if email.contains('@') && !email.trim().is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(
            "email address must contain an '@'".into(),
        ))
    }
}

fn validate_phone(phone: &str) -> Result<()> {
    if phone.len() == 10 && phone.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AppError::Validation("phone number must be 10 digits".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn seed_dataset_loads_and_is_non_empty() {
        let store = DataStore::new().unwrap();
        assert!(!store.registrations.is_empty());
        assert!(!store.transactions.is_empty());
        assert!(store.rewards.balance > 0);
    }

    #[tokio::test]
    async fn dashboard_summary_skips_completed_registrations() {
        let store = DataStore::new().unwrap();
        let summary = store.load_dashboard().await.unwrap();
        assert_eq!(summary.active_registrations, 3);
        assert_eq!(summary.monthly_outflow, 14000 + 52000 + 3500);
        let (date, payee) = summary.next_due.unwrap();
        assert_eq!(date, d("2025-08-28"));
        assert_eq!(payee, "Skyline Owners Association");
    }

    #[tokio::test]
    async fn unknown_registration_lookups_are_not_found() {
        let store = DataStore::new().unwrap();
        let err = store.find_registration("RG-9999").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn registration_lookup_ignores_id_case() {
        let store = DataStore::new().unwrap();
        let reg = store.find_registration("rg-2041").await.unwrap();
        assert_eq!(reg.payee, "Skyline Residency");
    }

    #[tokio::test]
    async fn tenant_update_validates_then_patches() {
        let mut store = DataStore::new().unwrap();

        let err = store
            .update_tenant("RG-2041", "not-an-email", "9812045671")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = store
            .update_tenant("RG-2041", "new@example.com", "12345")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        store
            .update_tenant("RG-2041", "new@example.com", "9000000001")
            .await
            .unwrap();
        let reg = store.find_registration("RG-2041").await.unwrap();
        assert_eq!(reg.tenant_email, "new@example.com");
        assert_eq!(reg.tenant_phone, "9000000001");
    }

    #[tokio::test]
    async fn redemption_enforces_the_points_rules() {
        let mut store = DataStore::new().unwrap();
        let today = d("2025-08-04");

        assert!(store.redeem_points(0, today).await.is_err());
        assert!(store.redeem_points(-100, today).await.is_err());
        assert!(store.redeem_points(150, today).await.is_err());
        assert!(store.redeem_points(2000, today).await.is_err());

        let history_before = store.rewards.history.len();
        let balance = store.redeem_points(500, today).await.unwrap();
        assert_eq!(balance, 750);
        assert_eq!(store.rewards.history.len(), history_before + 1);
    }

    #[tokio::test]
    async fn tickets_need_subject_and_message() {
        let mut store = DataStore::new().unwrap();
        assert!(store.submit_ticket("", "help").await.is_err());
        assert!(store.submit_ticket("help", "   ").await.is_err());

        let reference = store.submit_ticket("Billing", "Charged twice").await.unwrap();
        assert!(reference.starts_with("TKT-"));
        assert_eq!(store.tickets.len(), 1);
    }

    #[tokio::test]
    async fn profile_saves_only_valid_contact_details() {
        let mut store = DataStore::new().unwrap();
        let bad = Profile {
            name: "".into(),
            email: "a@b.c".into(),
            phone: "9812045671".into(),
        };
        assert!(store.save_profile(bad).await.is_err());

        let good = Profile {
            name: "Asha V".into(),
            email: "asha@example.com".into(),
            phone: "9812045671".into(),
        };
        store.save_profile(good.clone()).await.unwrap();
        assert_eq!(store.load_profile().await.unwrap(), good);
    }
}
