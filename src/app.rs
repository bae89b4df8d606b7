//! Application state handle passed explicitly to whatever needs it.

use crate::backend::{Persisted, StorageContext};
use crate::core::ledger::{LedgerState, TransferReceipt};
use crate::core::profile::{DisplayMode, Profile};
use crate::core::savings::SavingsBook;
use crate::core::{seed, AccountId, AccountSettings, Amount, LedgerResult, NewAccount};

pub const LEDGER_KEY: &str = "atm.ledger";
pub const PROFILE_KEY: &str = "atm.profile";
pub const SAVINGS_KEY: &str = "atm.savings";
pub const DISPLAY_MODE_KEY: &str = "atm.display-mode";

pub struct AppState {
    ctx: StorageContext,
    pub ledger: Persisted<LedgerState>,
    pub profile: Persisted<Profile>,
    pub savings: Persisted<SavingsBook>,
    pub display_mode: Persisted<DisplayMode>
}

impl AppState {
    /// Opens every key, falling back on the seeded dataset for keys never written.
    pub fn open(ctx: &StorageContext) -> AppState {
        AppState {
            ctx: ctx.clone(),
            ledger: Persisted::open(ctx, LEDGER_KEY, seed::initial_ledger()),
            profile: Persisted::open(ctx, PROFILE_KEY, seed::initial_profile()),
            savings: Persisted::open(ctx, SAVINGS_KEY, seed::initial_savings()),
            display_mode: Persisted::open(ctx, DISPLAY_MODE_KEY, seed::initial_display_mode())
        }
    }

    /// Pulls in changes other contexts made. Returns whether anything changed.
    pub fn sync(&mut self) -> bool {
        let ledger = self.ledger.sync();
        let profile = self.profile.sync();
        let savings = self.savings.sync();
        let display_mode = self.display_mode.sync();
        ledger || profile || savings || display_mode
    }

    /// Keys whose latest change was kept in memory but did not reach storage.
    pub fn unsaved_keys(&self) -> Vec<&str> {
        let saved = [
            (self.ledger.key(), self.ledger.is_saved()),
            (self.profile.key(), self.profile.is_saved()),
            (self.savings.key(), self.savings.is_saved()),
            (self.display_mode.key(), self.display_mode.is_saved())
        ];
        saved.into_iter().filter(|(_, ok)| !ok).map(|(key, _)| key).collect()
    }

    pub fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> LedgerResult<TransferReceipt> {
        self.ledger.try_update(|state| state.transfer(from, to, amount))
    }

    pub fn create_account(&mut self, request: NewAccount) -> LedgerResult<AccountId> {
        self.ledger.try_update(|state| state.create_account(request))
    }

    pub fn update_account(&mut self, id: &AccountId, settings: AccountSettings) -> LedgerResult<()> {
        self.ledger.try_update(|state| state.update_account(id, settings))
    }

    pub fn contribute(&mut self, goal_id: &str, amount: Amount) -> LedgerResult<Amount> {
        self.savings.try_update(|book| book.contribute(goal_id, amount))
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode.set(mode);
    }

    /// Forgets everything stored for this area and returns to the seeded data.
    /// Returns whether every key was removed from storage.
    pub fn reset(&mut self) -> bool {
        let mut removed = true;
        for key in [LEDGER_KEY, PROFILE_KEY, SAVINGS_KEY, DISPLAY_MODE_KEY] {
            if let Err(err) = self.ctx.remove_item(key) {
                log::warn!("error removing storage key {:?}: {}", key, err);
                removed = false;
            }
        }
        *self = AppState::open(&self.ctx);
        removed
    }
}
