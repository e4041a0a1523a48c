//! Application state shared across handlers

use common::session::SessionService;
use std::{path::PathBuf, sync::Arc};

use crate::{
    content::ContentGateway,
    leads::LeadCapture,
    repositories::{ContentStore, LeadStore},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionService,
    pub content: ContentGateway,
    pub leads: LeadCapture,
    /// Directory behind legacy `/uploads/...` image paths
    pub uploads_dir: PathBuf,
}

/// Default location of legacy uploads, relative to the working directory
pub const DEFAULT_UPLOADS_DIR: &str = "uploads";

impl AppState {
    /// Wire the services over the given stores
    pub fn new(
        sessions: SessionService,
        content_store: Arc<dyn ContentStore>,
        lead_store: Arc<dyn LeadStore>,
    ) -> Self {
        Self {
            sessions,
            content: ContentGateway::new(content_store),
            leads: LeadCapture::new(lead_store),
            uploads_dir: PathBuf::from(DEFAULT_UPLOADS_DIR),
        }
    }

    /// Serve legacy uploads from `dir`
    pub fn with_uploads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.uploads_dir = dir.into();
        self
    }
}
