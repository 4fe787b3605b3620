//! Background controller
//!
//! Owns the active matcher, hash and blacklist and reacts to browser events
//! and user messages. Lifecycle handlers (`on_*`) are best-effort: they log
//! collaborator failures and report whether they acted. Mutating operations
//! return storage failures to the caller.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use hb_core::{entry_for, hash_for, matcher_for, EncryptionMode, HashStrategy, Matcher, MatchingMode};
use tokio::sync::broadcast;

use crate::blacklist::{Blacklist, StorageBlacklist};
use crate::browser::{Browser, ClosedSession, ClosedTab, ClosedWindow, MenuItem, VisitInfo};
use crate::message::{Message, Reply};
use crate::notify::{BlacklistEvent, Notifier};
use crate::settings::Settings;
use crate::storage::KeyValueStore;
use crate::Result;

/// Context menu item that blocks the current tab's site.
pub const BLOCK_MENU_ITEM: &str = "blockthis";
/// Context menu item that unblocks the current tab's site.
pub const UNBLOCK_MENU_ITEM: &str = "unblockthis";

const MENU_ITEMS: [(&str, &str); 2] = [(BLOCK_MENU_ITEM, "block"), (UNBLOCK_MENU_ITEM, "unblock")];

/// Controller tuning.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// How many times the recently-closed list is polled after a close event.
    pub session_poll_attempts: u32,
    /// Delay before the second poll; doubled after each further miss.
    pub session_poll_backoff: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            session_poll_attempts: 4,
            session_poll_backoff: Duration::from_millis(25),
        }
    }
}

/// The swappable strategy set. Always replaced as a whole under the lock.
#[derive(Clone)]
struct Strategies {
    matcher: Arc<dyn Matcher>,
    hash: Arc<dyn HashStrategy>,
    blacklist: Arc<dyn Blacklist>,
}

impl Strategies {
    fn entry(&self, url: &str) -> Option<String> {
        let entry = entry_for(self.matcher.as_ref(), self.hash.as_ref(), url);
        if entry.is_none() {
            log::debug!("no {} key for {:?}", self.matcher.mode(), url);
        }
        entry
    }
}

pub struct Controller {
    strategies: RwLock<Strategies>,
    settings: Settings,
    browser: Browser,
    notifier: Notifier,
    config: ControllerConfig,
}

impl Controller {
    /// Load the persisted modes and build a ready controller.
    ///
    /// The resolved modes are written back so the stored configuration is
    /// always explicit, then the context menu is attached.
    pub async fn start(
        store: Arc<dyn KeyValueStore>,
        browser: Browser,
        notifier: Notifier,
        config: ControllerConfig,
    ) -> Result<Self> {
        let settings = Settings::new(Arc::clone(&store));

        let matching = settings.matching().await?;
        let encryption = settings.encryption().await?;
        settings.set_matching(matching).await?;
        settings.set_encryption(encryption).await?;
        settings.set_blacklist_type(StorageBlacklist::KIND).await?;

        let hash = hash_for(encryption);
        let blacklist = StorageBlacklist::new(store, Arc::clone(&hash), notifier.clone());
        let controller = Self {
            strategies: RwLock::new(Strategies {
                matcher: matcher_for(matching),
                hash,
                blacklist: Arc::new(blacklist),
            }),
            settings,
            browser,
            notifier,
            config,
        };

        if let Err(err) = controller.attach_context_menu_controls().await {
            log::warn!("context menu unavailable: {}", err);
        }

        log::info!("controller started (matching: {}, encryption: {})", matching, encryption);
        Ok(controller)
    }

    fn strategies(&self) -> Strategies {
        self.strategies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update_strategies(&self, update: impl FnOnce(&mut Strategies)) {
        let mut strategies = self.strategies.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut strategies);
    }

    pub fn matching_mode(&self) -> MatchingMode {
        self.strategies().matcher.mode()
    }

    pub fn encryption_mode(&self) -> EncryptionMode {
        self.strategies().hash.mode()
    }

    pub fn blacklist(&self) -> Arc<dyn Blacklist> {
        self.strategies().blacklist
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Listen for `BLACKLIST_UPDATED`.
    pub fn subscribe(&self) -> broadcast::Receiver<BlacklistEvent> {
        self.notifier.subscribe()
    }

    // =========================================================================
    // Blacklist operations
    // =========================================================================

    /// Blacklist the site of `url` and scrub it from history.
    ///
    /// Returns `false` when the URL has no key or is already blacklisted.
    pub async fn block(&self, url: &str) -> Result<bool> {
        let strategies = self.strategies();
        let Some(entry) = strategies.entry(url) else {
            return Ok(false);
        };
        if !strategies.blacklist.add(&entry).await? {
            log::debug!("{:?} already blacklisted", url);
            return Ok(false);
        }

        self.remove_cookies_logged(url).await;
        self.delete_history(url).await;
        Ok(true)
    }

    /// Remove the site of `url` from the blacklist.
    pub async fn unblock(&self, url: &str) -> Result<bool> {
        let strategies = self.strategies();
        let Some(entry) = strategies.entry(url) else {
            return Ok(false);
        };
        Ok(strategies.blacklist.remove(&entry).await?)
    }

    /// Whether `url` is blacklisted under the active modes.
    pub async fn is_blacklisted(&self, url: &str) -> Result<bool> {
        let strategies = self.strategies();
        match strategies.entry(url) {
            Some(entry) => Ok(strategies.blacklist.contains(&entry).await?),
            None => Ok(false),
        }
    }

    pub async fn list_blacklist(&self) -> Result<Vec<String>> {
        Ok(self.blacklist().list().await?)
    }

    /// Import comma-separated entries. Returns how many were added.
    pub async fn import_blacklist(&self, list: &str) -> Result<usize> {
        Ok(self.blacklist().import(list).await?)
    }

    pub async fn clear_blacklist(&self) -> Result<()> {
        Ok(self.blacklist().clear().await?)
    }

    // =========================================================================
    // Lifecycle events
    // =========================================================================

    /// Delete a visit to a blacklisted site. Returns whether it was deleted.
    pub async fn on_page_visited(&self, visit: &VisitInfo) -> bool {
        match self.is_blacklisted(&visit.url).await {
            Ok(true) => self.delete_history(&visit.url).await,
            Ok(false) => false,
            Err(err) => {
                log::warn!("visit check failed for {:?}: {}", visit.url, err);
                false
            }
        }
    }

    /// Forget the just-closed tab if it shows a blacklisted site.
    pub async fn on_tab_removed(&self) -> bool {
        let Some(tab) = self
            .poll_recently_closed(|session| match session {
                ClosedSession::Tab(tab) => Some(tab),
                ClosedSession::Window(_) => None,
            })
            .await
        else {
            log::debug!("no closed tab to inspect");
            return false;
        };

        if !self.is_blacklisted_logged(&tab.url).await {
            return false;
        }
        self.forget_tab(&tab).await;
        self.remove_cookies_logged(&tab.url).await;
        true
    }

    /// Forget the just-closed window if any of its tabs shows a blacklisted
    /// site. Cookies are removed for every matching tab.
    pub async fn on_window_removed(&self) -> bool {
        let Some(window) = self
            .poll_recently_closed(|session| match session {
                ClosedSession::Window(window) => Some(window),
                ClosedSession::Tab(_) => None,
            })
            .await
        else {
            log::debug!("no closed window to inspect");
            return false;
        };

        let matching = match self.blacklisted_tabs(&window).await {
            Ok(tabs) => tabs,
            Err(err) => {
                log::warn!("window check failed: {}", err);
                return false;
            }
        };
        if matching.is_empty() {
            return false;
        }

        self.forget_window(&window).await;
        for tab in matching {
            self.remove_cookies_logged(&tab.url).await;
        }
        true
    }

    async fn blacklisted_tabs<'w>(&self, window: &'w ClosedWindow) -> Result<Vec<&'w ClosedTab>> {
        let strategies = self.strategies();
        let entries = strategies.blacklist.list().await?;
        Ok(window
            .tabs
            .iter()
            .filter(|tab| {
                strategies
                    .entry(&tab.url)
                    .is_some_and(|entry| entries.contains(&entry))
            })
            .collect())
    }

    /// Poll the newest recently-closed entry until `pick` accepts it,
    /// backing off exponentially between attempts.
    async fn poll_recently_closed<T>(&self, pick: impl Fn(ClosedSession) -> Option<T>) -> Option<T> {
        let mut delay = self.config.session_poll_backoff;
        for attempt in 1..=self.config.session_poll_attempts {
            match self.browser.sessions.recently_closed(1).await {
                Ok(sessions) => {
                    if let Some(found) = sessions.into_iter().next().and_then(&pick) {
                        return Some(found);
                    }
                }
                Err(err) => {
                    log::warn!("cannot read recently closed sessions: {}", err);
                    return None;
                }
            }
            if attempt < self.config.session_poll_attempts {
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
        }
        None
    }

    async fn is_blacklisted_logged(&self, url: &str) -> bool {
        self.is_blacklisted(url).await.unwrap_or_else(|err| {
            log::warn!("blacklist check failed for {:?}: {}", url, err);
            false
        })
    }

    async fn delete_history(&self, url: &str) -> bool {
        match self.browser.history.delete_url(url).await {
            Ok(()) => {
                log::info!("deleted history for {:?}", url);
                true
            }
            Err(err) => {
                log::warn!("history delete failed for {:?}: {}", url, err);
                false
            }
        }
    }

    async fn forget_tab(&self, tab: &ClosedTab) {
        match self
            .browser
            .sessions
            .forget_closed_tab(tab.window_id, &tab.session_id)
            .await
        {
            Ok(()) => log::info!("forgot closed tab {}", tab.session_id),
            Err(err) => log::warn!("cannot forget closed tab {}: {}", tab.session_id, err),
        }
    }

    async fn forget_window(&self, window: &ClosedWindow) {
        match self.browser.sessions.forget_closed_window(&window.session_id).await {
            Ok(()) => log::info!("forgot closed window {}", window.session_id),
            Err(err) => log::warn!("cannot forget closed window {}: {}", window.session_id, err),
        }
    }

    // =========================================================================
    // Cookies
    // =========================================================================

    /// Delete every cookie sent to `url`, if cookie removal is enabled.
    /// A failed delete is logged and the rest are still attempted. Returns
    /// how many were deleted.
    pub async fn remove_cookies(&self, url: &str) -> Result<usize> {
        if !self.settings.blacklist_cookies().await? {
            return Ok(0);
        }

        let cookies = self.browser.cookies.get_all(url).await?;
        let mut removed = 0;
        for cookie in &cookies {
            match self.browser.cookies.remove(url, &cookie.name).await {
                Ok(()) => removed += 1,
                Err(err) => log::warn!("cannot remove cookie {} for {:?}: {}", cookie.name, url, err),
            }
        }
        if removed > 0 {
            log::info!("removed {} of {} cookies for {:?}", removed, cookies.len(), url);
        }
        Ok(removed)
    }

    async fn remove_cookies_logged(&self, url: &str) {
        if let Err(err) = self.remove_cookies(url).await {
            log::warn!("cookie removal failed for {:?}: {}", url, err);
        }
    }

    pub async fn enable_blacklist_cookies(&self) -> Result<()> {
        Ok(self.settings.set_blacklist_cookies(true).await?)
    }

    pub async fn disable_blacklist_cookies(&self) -> Result<()> {
        Ok(self.settings.set_blacklist_cookies(false).await?)
    }

    // =========================================================================
    // Mode changes
    // =========================================================================

    /// Switch the matching mode. Clears the blacklist.
    ///
    /// If the clear fails the previous mode is restored, so stored entries
    /// never outlive the mode they were made under.
    pub async fn change_blacklist_matching(&self, mode: MatchingMode) -> Result<()> {
        let previous = self.strategies();
        self.settings.set_matching(mode).await?;
        self.update_strategies(|s| s.matcher = matcher_for(mode));

        if let Err(err) = self.clear_blacklist().await {
            let old = previous.matcher.mode();
            self.update_strategies(|s| s.matcher = previous.matcher);
            if let Err(restore) = self.settings.set_matching(old).await {
                log::warn!("cannot restore matching mode {}: {}", old, restore);
            }
            log::warn!("matching mode change to {} rolled back: {}", mode, err);
            return Err(err);
        }

        log::info!("matching mode is now {}", mode);
        Ok(())
    }

    /// Switch the encryption mode. Clears the blacklist, restoring the
    /// previous mode if that fails.
    pub async fn change_blacklist_encryption(&self, mode: EncryptionMode) -> Result<()> {
        let previous = self.strategies();
        self.settings.set_encryption(mode).await?;
        self.update_strategies(|s| {
            s.hash = hash_for(mode);
            s.blacklist = s.blacklist.with_hash(Arc::clone(&s.hash));
        });

        if let Err(err) = self.clear_blacklist().await {
            let old = previous.hash.mode();
            self.update_strategies(|s| {
                s.hash = previous.hash;
                s.blacklist = previous.blacklist;
            });
            if let Err(restore) = self.settings.set_encryption(old).await {
                log::warn!("cannot restore encryption mode {}: {}", old, restore);
            }
            log::warn!("encryption mode change to {} rolled back: {}", mode, err);
            return Err(err);
        }

        log::info!("encryption mode is now {}", mode);
        Ok(())
    }

    // =========================================================================
    // Context menu
    // =========================================================================

    /// Rebuild the context menu from the `enableContextMenu` flag, which
    /// defaults to on.
    pub async fn attach_context_menu_controls(&self) -> Result<()> {
        let enabled = match self.settings.context_menu_enabled().await? {
            Some(enabled) => enabled,
            None => {
                self.settings.set_context_menu_enabled(true).await?;
                true
            }
        };

        for (id, _) in MENU_ITEMS {
            // Absent items are fine
            if let Err(err) = self.browser.menus.remove(id).await {
                log::trace!("menu item {} not removed: {}", id, err);
            }
        }
        if !enabled {
            return Ok(());
        }

        for (id, title_key) in MENU_ITEMS {
            let item = MenuItem {
                id: id.to_string(),
                title_key: title_key.to_string(),
            };
            self.browser.menus.create(&item).await?;
        }
        Ok(())
    }

    pub async fn change_context_menu_controls(&self, enabled: bool) -> Result<()> {
        self.settings.set_context_menu_enabled(enabled).await?;
        self.attach_context_menu_controls().await
    }

    /// Route a context menu click on the tab showing `tab_url`.
    pub async fn on_context_menu_clicked(&self, menu_item_id: &str, tab_url: &str) -> Result<bool> {
        match menu_item_id {
            BLOCK_MENU_ITEM => self.block(tab_url).await,
            UNBLOCK_MENU_ITEM => self.unblock(tab_url).await,
            other => {
                log::debug!("ignoring menu item {:?}", other);
                Ok(false)
            }
        }
    }

    // =========================================================================
    // Messages
    // =========================================================================

    /// Handle one message from the options page.
    pub async fn on_message(&self, message: Message) -> Result<Reply> {
        log::debug!("message: {:?}", message);
        match message {
            Message::GetBlacklist => {
                return Ok(Reply::Blacklist {
                    blacklist: self.list_blacklist().await?,
                })
            }
            Message::AddToBlacklist { url } => {
                self.block(&url).await?;
            }
            Message::RemoveFromBlacklist { url } => {
                self.unblock(&url).await?;
            }
            Message::ImportBlacklist { blacklist } => {
                self.import_blacklist(&blacklist).await?;
            }
            Message::ClearBlacklist => self.clear_blacklist().await?,
            Message::ChangeBlacklistEncryptionType { encryption } => {
                self.change_blacklist_encryption(encryption.parse()?).await?
            }
            Message::ChangeBlacklistMatching { matching } => {
                self.change_blacklist_matching(matching.parse()?).await?
            }
            Message::EnableBlacklistCookies => self.enable_blacklist_cookies().await?,
            Message::DisableBlacklistCookies => self.disable_blacklist_cookies().await?,
            Message::ChangeContextMenuControls { enabled } => {
                self.change_context_menu_controls(enabled).await?
            }
        }
        Ok(Reply::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StoreError};
    use crate::testing::{FlakyStore, RecordingBrowser};
    use crate::Error;
    use hb_core::sha1_hex;
    use serde_json::{json, Value};
    use tokio::sync::broadcast::error::TryRecvError;

    async fn start_with(values: Vec<(&str, Value)>) -> (Controller, Arc<MemoryStore>, Arc<RecordingBrowser>) {
        let store = Arc::new(MemoryStore::with_values(values));
        let browser = RecordingBrowser::new();
        let controller = Controller::start(
            store.clone(),
            browser.browser(),
            Notifier::new(),
            ControllerConfig::default(),
        )
        .await
        .unwrap();
        (controller, store, browser)
    }

    fn closed_tab(url: &str, session_id: &str) -> ClosedTab {
        ClosedTab {
            url: url.to_string(),
            window_id: 1,
            session_id: session_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_start_persists_defaults() {
        let (controller, store, browser) = start_with(vec![]).await;

        assert_eq!(controller.matching_mode(), MatchingMode::Domain);
        assert_eq!(controller.encryption_mode(), EncryptionMode::Sha1);

        let values = store.snapshot();
        assert_eq!(values["matching"], json!("domain"));
        assert_eq!(values["encryption"], json!("sha1"));
        assert_eq!(values["blacklistType"], json!("sync"));
        assert_eq!(values["enableContextMenu"], json!(true));
        assert_eq!(browser.menu_items(), vec![BLOCK_MENU_ITEM, UNBLOCK_MENU_ITEM]);
    }

    #[tokio::test]
    async fn test_start_reads_legacy_encryption() {
        let (controller, store, _) = start_with(vec![("matching", json!("url")), ("type", json!("none"))]).await;

        assert_eq!(controller.matching_mode(), MatchingMode::Url);
        assert_eq!(controller.encryption_mode(), EncryptionMode::None);
        assert_eq!(store.snapshot()["encryption"], json!("none"));
    }

    #[tokio::test]
    async fn test_block_twice_leaves_one_entry() {
        let (controller, _, browser) = start_with(vec![]).await;

        assert!(controller.block("https://mail.google.com/inbox").await.unwrap());
        assert!(!controller.block("https://www.google.com/").await.unwrap());

        assert_eq!(controller.list_blacklist().await.unwrap(), vec![sha1_hex(b"google.com")]);
        assert_eq!(browser.deleted_urls(), vec!["https://mail.google.com/inbox"]);
    }

    #[tokio::test]
    async fn test_block_without_key_is_noop() {
        let (controller, store, browser) = start_with(vec![]).await;
        let mut rx = controller.subscribe();

        assert!(!controller.block("about:blank").await.unwrap());

        assert_eq!(store.snapshot().get("blacklist"), None);
        assert!(browser.deleted_urls().is_empty());
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_block_notifies() {
        let (controller, _, _) = start_with(vec![]).await;
        let mut rx = controller.subscribe();

        controller.block("https://example.com/").await.unwrap();
        assert_eq!(rx.try_recv(), Ok(BlacklistEvent::BlacklistUpdated));
    }

    #[tokio::test]
    async fn test_block_survives_history_failure() {
        let (controller, _, browser) = start_with(vec![]).await;
        browser.fail_history(true);

        assert!(controller.block("https://example.com/").await.unwrap());
        assert!(controller.is_blacklisted("https://example.com/other").await.unwrap());
    }

    #[tokio::test]
    async fn test_unblock_never_blocked_is_noop() {
        let (controller, store, _) = start_with(vec![("blacklist", json!(["x"]))]).await;

        assert!(!controller.unblock("https://example.com/").await.unwrap());
        assert_eq!(store.snapshot()["blacklist"], json!(["x"]));
    }

    #[tokio::test]
    async fn test_unblock_removes_entry() {
        let (controller, _, _) = start_with(vec![]).await;
        controller.block("https://example.com/").await.unwrap();

        assert!(controller.unblock("https://sub.example.com/").await.unwrap());
        assert!(controller.list_blacklist().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_change_matching_clears_blacklist() {
        let (controller, store, _) = start_with(vec![]).await;
        controller.block("https://google.com/").await.unwrap();
        controller.block("https://example.com/").await.unwrap();

        controller.change_blacklist_matching(MatchingMode::Subdomain).await.unwrap();

        assert!(controller.list_blacklist().await.unwrap().is_empty());
        assert_eq!(controller.matching_mode(), MatchingMode::Subdomain);
        assert_eq!(store.snapshot()["matching"], json!("subdomain"));

        // New mode is in effect for the next block
        controller.block("https://www.example.com/").await.unwrap();
        assert_eq!(controller.list_blacklist().await.unwrap(), vec![sha1_hex(b"www.example.com")]);
    }

    #[tokio::test]
    async fn test_change_encryption_swaps_import_validation() {
        let (controller, store, _) = start_with(vec![]).await;
        controller.block("https://google.com/").await.unwrap();

        controller.change_blacklist_encryption(EncryptionMode::None).await.unwrap();

        assert_eq!(controller.encryption_mode(), EncryptionMode::None);
        assert_eq!(store.snapshot()["encryption"], json!("none"));
        assert_eq!(controller.import_blacklist("abc,  def ,abc").await.unwrap(), 2);
        assert_eq!(controller.list_blacklist().await.unwrap(), vec!["abc", "def"]);

        controller.block("https://www.google.com/x").await.unwrap();
        assert!(controller.list_blacklist().await.unwrap().contains(&"google.com".to_string()));
    }

    #[tokio::test]
    async fn test_mode_change_storage_failure_keeps_strategy() {
        let store = Arc::new(FlakyStore::new());
        let browser = RecordingBrowser::new();
        let controller = Controller::start(
            store.clone(),
            browser.browser(),
            Notifier::new(),
            ControllerConfig::default(),
        )
        .await
        .unwrap();

        store.fail_writes(true);
        let result = controller.change_blacklist_matching(MatchingMode::Url).await;

        assert!(matches!(result, Err(Error::Storage(StoreError::Backend(_)))));
        assert_eq!(controller.matching_mode(), MatchingMode::Domain);
    }

    async fn start_flaky() -> (Controller, Arc<FlakyStore>) {
        let store = Arc::new(FlakyStore::new());
        let controller = Controller::start(
            store.clone(),
            RecordingBrowser::new().browser(),
            Notifier::new(),
            ControllerConfig::default(),
        )
        .await
        .unwrap();
        (controller, store)
    }

    #[tokio::test]
    async fn test_failed_clear_restores_matching_mode() {
        let (controller, store) = start_flaky().await;
        controller.block("https://example.com/").await.unwrap();

        store.fail_removes(true);
        let result = controller.change_blacklist_matching(MatchingMode::Subdomain).await;

        assert!(matches!(result, Err(Error::Storage(StoreError::Backend(_)))));
        assert_eq!(controller.matching_mode(), MatchingMode::Domain);
        assert_eq!(controller.settings().matching().await.unwrap(), MatchingMode::Domain);
        assert!(controller.is_blacklisted("https://www.example.com/").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_clear_restores_encryption_mode() {
        let (controller, store) = start_flaky().await;
        controller.block("https://example.com/").await.unwrap();

        store.fail_removes(true);
        assert!(controller.change_blacklist_encryption(EncryptionMode::None).await.is_err());

        assert_eq!(controller.encryption_mode(), EncryptionMode::Sha1);
        assert_eq!(controller.settings().encryption().await.unwrap(), EncryptionMode::Sha1);
        assert_eq!(controller.list_blacklist().await.unwrap(), vec![sha1_hex(b"example.com")]);

        // Imports are still validated as SHA-1
        store.fail_removes(false);
        assert_eq!(controller.import_blacklist("plain.com").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_block_storage_failure_surfaces() {
        let store = Arc::new(FlakyStore::new());
        let browser = RecordingBrowser::new();
        let controller = Controller::start(
            store.clone(),
            browser.browser(),
            Notifier::new(),
            ControllerConfig::default(),
        )
        .await
        .unwrap();

        store.fail_writes(true);
        assert!(controller.block("https://example.com/").await.is_err());
        assert!(browser.deleted_urls().is_empty());
    }

    #[tokio::test]
    async fn test_page_visit_deletes_blacklisted_once() {
        let (controller, _, browser) = start_with(vec![]).await;
        controller.block("https://example.com/").await.unwrap();
        let before = browser.deleted_urls().len();

        assert!(controller.on_page_visited(&VisitInfo::new("https://www.example.com/a")).await);
        assert!(!controller.on_page_visited(&VisitInfo::new("https://other.org/")).await);

        assert_eq!(&browser.deleted_urls()[before..], ["https://www.example.com/a"]);
    }

    #[tokio::test]
    async fn test_page_visit_unmatchable_url() {
        let (controller, _, browser) = start_with(vec![]).await;
        assert!(!controller.on_page_visited(&VisitInfo::new("about:blank")).await);
        assert!(browser.deleted_urls().is_empty());
    }

    #[tokio::test]
    async fn test_tab_removed_forgets_blacklisted_tab() {
        let (controller, store, browser) = start_with(vec![]).await;
        controller.block("https://example.com/").await.unwrap();
        store.set("blacklistCookies", json!(true)).await.unwrap();
        browser.set_cookies("https://example.com/page", &["sid", "pref"]);
        browser.push_closed(vec![ClosedSession::Tab(closed_tab("https://example.com/page", "7"))]);

        assert!(controller.on_tab_removed().await);

        assert_eq!(browser.forgotten_tabs(), vec![(1, "7".to_string())]);
        assert_eq!(
            browser.removed_cookies(),
            vec![
                ("https://example.com/page".to_string(), "sid".to_string()),
                ("https://example.com/page".to_string(), "pref".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_tab_removed_ignores_clean_tab() {
        let (controller, _, browser) = start_with(vec![]).await;
        browser.push_closed(vec![ClosedSession::Tab(closed_tab("https://example.com/", "7"))]);

        assert!(!controller.on_tab_removed().await);
        assert!(browser.forgotten_tabs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tab_removed_polls_until_tab_appears() {
        let (controller, _, browser) = start_with(vec![]).await;
        controller.block("https://example.com/").await.unwrap();
        browser.push_closed(vec![]);
        browser.push_closed(vec![]);
        browser.push_closed(vec![ClosedSession::Tab(closed_tab("https://example.com/", "9"))]);

        assert!(controller.on_tab_removed().await);
        assert_eq!(browser.session_polls(), 3);
        assert_eq!(browser.forgotten_tabs(), vec![(1, "9".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tab_removed_gives_up_after_attempts() {
        let (controller, _, browser) = start_with(vec![]).await;

        assert!(!controller.on_tab_removed().await);
        assert_eq!(browser.session_polls(), 4);
    }

    #[tokio::test]
    async fn test_session_failure_is_swallowed() {
        let (controller, _, browser) = start_with(vec![]).await;
        browser.fail_sessions(true);

        assert!(!controller.on_tab_removed().await);
        assert!(!controller.on_window_removed().await);
        assert_eq!(browser.session_polls(), 2);
    }

    #[tokio::test]
    async fn test_window_removed_forgets_if_any_tab_matches() {
        let (controller, store, browser) = start_with(vec![]).await;
        controller.block("https://example.com/").await.unwrap();
        store.set("blacklistCookies", json!(true)).await.unwrap();
        browser.set_cookies("https://www.example.com/b", &["sid"]);
        browser.push_closed(vec![ClosedSession::Window(ClosedWindow {
            session_id: "w1".to_string(),
            tabs: vec![
                closed_tab("https://clean.org/", "1"),
                closed_tab("https://www.example.com/b", "2"),
            ],
        })]);

        assert!(controller.on_window_removed().await);

        assert_eq!(browser.forgotten_windows(), vec!["w1"]);
        assert!(browser.forgotten_tabs().is_empty());
        assert_eq!(
            browser.removed_cookies(),
            vec![("https://www.example.com/b".to_string(), "sid".to_string())]
        );
    }

    #[tokio::test]
    async fn test_window_removed_ignores_clean_window() {
        let (controller, _, browser) = start_with(vec![]).await;
        browser.push_closed(vec![ClosedSession::Window(ClosedWindow {
            session_id: "w1".to_string(),
            tabs: vec![closed_tab("https://clean.org/", "1")],
        })]);

        assert!(!controller.on_window_removed().await);
        assert!(browser.forgotten_windows().is_empty());
    }

    #[tokio::test]
    async fn test_remove_cookies_gated() {
        let (controller, _, browser) = start_with(vec![]).await;
        browser.set_cookies("https://example.com/", &["sid"]);

        assert_eq!(controller.remove_cookies("https://example.com/").await.unwrap(), 0);
        assert!(browser.removed_cookies().is_empty());

        controller.enable_blacklist_cookies().await.unwrap();
        assert_eq!(controller.remove_cookies("https://example.com/").await.unwrap(), 1);

        controller.disable_blacklist_cookies().await.unwrap();
        assert_eq!(controller.remove_cookies("https://example.com/").await.unwrap(), 0);
        assert_eq!(browser.removed_cookies().len(), 1);
    }

    #[tokio::test]
    async fn test_cookie_removal_continues_past_failure() {
        let (controller, _, browser) = start_with(vec![("blacklistCookies", json!(true))]).await;
        browser.set_cookies("https://example.com/", &["a", "b", "c"]);
        browser.lock_cookie("a");

        assert!(controller.block("https://example.com/").await.unwrap());

        let names: Vec<_> = browser.removed_cookies().into_iter().map(|(_, name)| name).collect();
        assert_eq!(names, vec!["b", "c"]);
        assert_eq!(controller.remove_cookies("https://example.com/").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_block_removes_cookies_when_enabled() {
        let (controller, _, browser) = start_with(vec![("blacklistCookies", json!(true))]).await;
        browser.set_cookies("https://example.com/", &["a", "b"]);

        controller.block("https://example.com/").await.unwrap();
        assert_eq!(browser.removed_cookies().len(), 2);
    }

    #[tokio::test]
    async fn test_context_menu_disable_and_enable() {
        let (controller, store, browser) = start_with(vec![]).await;

        controller.change_context_menu_controls(false).await.unwrap();
        assert!(browser.menu_items().is_empty());
        assert_eq!(store.snapshot()["enableContextMenu"], json!(false));

        controller.change_context_menu_controls(true).await.unwrap();
        assert_eq!(browser.menu_items(), vec![BLOCK_MENU_ITEM, UNBLOCK_MENU_ITEM]);

        // Re-attaching does not duplicate
        controller.attach_context_menu_controls().await.unwrap();
        assert_eq!(browser.menu_items().len(), 2);
    }

    #[tokio::test]
    async fn test_start_respects_disabled_menu() {
        let (_, _, browser) = start_with(vec![("enableContextMenu", json!(false))]).await;
        assert!(browser.menu_items().is_empty());
    }

    #[tokio::test]
    async fn test_context_menu_click_routes() {
        let (controller, _, _) = start_with(vec![]).await;

        assert!(controller
            .on_context_menu_clicked(BLOCK_MENU_ITEM, "https://example.com/")
            .await
            .unwrap());
        assert!(controller.is_blacklisted("https://example.com/").await.unwrap());

        assert!(!controller
            .on_context_menu_clicked("somethingelse", "https://example.com/")
            .await
            .unwrap());

        assert!(controller
            .on_context_menu_clicked(UNBLOCK_MENU_ITEM, "https://example.com/")
            .await
            .unwrap());
        assert!(!controller.is_blacklisted("https://example.com/").await.unwrap());
    }

    #[tokio::test]
    async fn test_messages() {
        let (controller, store, _) = start_with(vec![]).await;

        let reply = controller
            .on_message(Message::ChangeBlacklistEncryptionType {
                encryption: "none".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(reply, Reply::Done);

        controller
            .on_message(Message::AddToBlacklist {
                url: "https://www.example.com/".to_string(),
            })
            .await
            .unwrap();
        controller
            .on_message(Message::ImportBlacklist {
                blacklist: "a.com,b.com".to_string(),
            })
            .await
            .unwrap();
        controller
            .on_message(Message::RemoveFromBlacklist {
                url: "https://a.com/".to_string(),
            })
            .await
            .unwrap();
        controller.on_message(Message::EnableBlacklistCookies).await.unwrap();

        let reply = controller.on_message(Message::GetBlacklist).await.unwrap();
        assert_eq!(
            reply,
            Reply::Blacklist {
                blacklist: vec!["example.com".to_string(), "b.com".to_string()]
            }
        );
        assert_eq!(store.snapshot()["blacklistCookies"], json!(true));

        controller.on_message(Message::ClearBlacklist).await.unwrap();
        assert!(controller.list_blacklist().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_message_with_unknown_mode_is_rejected() {
        let (controller, _, _) = start_with(vec![]).await;
        controller.block("https://example.com/").await.unwrap();

        let result = controller
            .on_message(Message::ChangeBlacklistMatching {
                matching: "regex".to_string(),
            })
            .await;

        assert!(matches!(result, Err(Error::InvalidMode(_))));
        assert_eq!(controller.matching_mode(), MatchingMode::Domain);
        assert_eq!(controller.list_blacklist().await.unwrap().len(), 1);
    }
}
