//! Engine wiring
//!
//! [`EngineBuilder`] assembles every strategy into the fixed chain and
//! hands back a ready [`Dispatcher`]. There is no global engine; callers
//! build one per workspace.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dispatch_application::config::EngineSettings;
use dispatch_application::ports::dispatch_logger::DispatchLogger;
use dispatch_application::ports::file_capability::FileCapability;
use dispatch_application::{
    Dispatcher, ExpressionStrategy, FileOperationResolver, GenericFunctionFallback, StrategyChain,
};
use tracing::{debug, warn};

use crate::command::RawCommandResolver;
use crate::config::FileConfig;
use crate::execution::CodeExecutionEngine;
use crate::files::WorkspaceFileManager;
use crate::logging::JsonlDispatchLogger;
use crate::system::SystemIntrospectionResolver;
use crate::web::NetworkResolver;

pub struct EngineBuilder {
    workspace_root: PathBuf,
    settings: EngineSettings,
    files: Option<Arc<dyn FileCapability>>,
    logger: Option<Arc<dyn DispatchLogger>>,
}

impl EngineBuilder {
    /// Start with default settings and no file manager.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            settings: EngineSettings::default(),
            files: None,
            logger: None,
        }
    }

    /// Build from loaded configuration.
    ///
    /// `workspace_override` wins over `[engine] workspace_root`, which wins
    /// over the current directory. The workspace file manager is attached
    /// and `[logging] dispatch_log` enables the JSONL log.
    pub fn from_config(config: &FileConfig, workspace_override: Option<PathBuf>) -> Self {
        let root = workspace_override
            .or_else(|| config.engine.workspace_root.clone())
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut builder = Self::new(root)
            .with_settings(config.to_engine_settings())
            .with_workspace_files();

        if let Some(path) = &config.logging.dispatch_log {
            match JsonlDispatchLogger::open(path) {
                Some(logger) => {
                    debug!(path = %logger.path().display(), "Dispatch log enabled");
                    builder = builder.with_logger(Arc::new(logger));
                }
                None => warn!("Dispatch log disabled: could not open {}", path.display()),
            }
        }
        builder
    }

    // ==================== Builder Methods ====================

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_file_capability(mut self, files: Arc<dyn FileCapability>) -> Self {
        self.files = Some(files);
        self
    }

    /// Attach a [`WorkspaceFileManager`] rooted at the workspace.
    pub fn with_workspace_files(self) -> Self {
        let files = Arc::new(WorkspaceFileManager::new(self.workspace_root.clone()));
        self.with_file_capability(files)
    }

    pub fn with_logger(mut self, logger: Arc<dyn DispatchLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Wire the full chain in its fixed order.
    pub fn build(self) -> Dispatcher {
        let root = self.workspace_root;
        let settings = self.settings;

        let chain = StrategyChain::new()
            .with_file_operations(FileOperationResolver::new(self.files.clone()))
            .with_code_execution(CodeExecutionEngine::new(root.clone(), settings.clone()))
            .with_expression(ExpressionStrategy::new())
            .with_system(SystemIntrospectionResolver::new(root.clone(), settings.clone()))
            .with_raw_command(RawCommandResolver::new(root.clone(), settings.clone()))
            .with_network(NetworkResolver::new(
                root.clone(),
                settings,
                self.files.clone(),
            ))
            .with_generic_fallback(GenericFunctionFallback::new(self.files));

        let dispatcher = Dispatcher::new(root, chain);
        match self.logger {
            Some(logger) => dispatcher.with_logger(logger),
            None => dispatcher,
        }
    }
}
