//! Stand-in browser for the command line
//!
//! There is no history or session list outside an extension host, so every
//! action is logged and reported as done.

use async_trait::async_trait;
use hb_background::browser::{ClosedSession, ContextMenus, Cookies, History, MenuItem, Sessions};
use hb_background::{BrowserError, Cookie};

pub struct LoggingBrowser;

#[async_trait]
impl History for LoggingBrowser {
    async fn delete_url(&self, url: &str) -> Result<(), BrowserError> {
        log::info!("history: delete {}", url);
        Ok(())
    }
}

#[async_trait]
impl Sessions for LoggingBrowser {
    async fn recently_closed(&self, _max_results: usize) -> Result<Vec<ClosedSession>, BrowserError> {
        Ok(Vec::new())
    }

    async fn forget_closed_tab(&self, window_id: i64, session_id: &str) -> Result<(), BrowserError> {
        log::info!("sessions: forget tab {} in window {}", session_id, window_id);
        Ok(())
    }

    async fn forget_closed_window(&self, session_id: &str) -> Result<(), BrowserError> {
        log::info!("sessions: forget window {}", session_id);
        Ok(())
    }
}

#[async_trait]
impl Cookies for LoggingBrowser {
    async fn get_all(&self, _url: &str) -> Result<Vec<Cookie>, BrowserError> {
        Ok(Vec::new())
    }

    async fn remove(&self, url: &str, name: &str) -> Result<(), BrowserError> {
        log::info!("cookies: remove {} for {}", name, url);
        Ok(())
    }
}

#[async_trait]
impl ContextMenus for LoggingBrowser {
    async fn create(&self, item: &MenuItem) -> Result<(), BrowserError> {
        log::debug!("menus: create {}", item.id);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), BrowserError> {
        log::debug!("menus: remove {}", id);
        Ok(())
    }
}
