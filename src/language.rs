//! The language service: compile entry points, caching and lifecycle.

pub mod cache;
pub mod config;

pub use cache::ExpressionCache;
pub use config::LanguageConfig;

use crate::expression::{Expression, Predicate};
use crate::simple::{self, CompileMode, CompileResult};
use log::{debug, info, trace};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServiceState {
    Stopped,
    Started,
}

/// Compiles expression and predicate text, reusing earlier results.
///
/// Compiling works in any state; stopping the service drops every cached
/// entry.
pub struct SimpleLanguage {
    config: Arc<LanguageConfig>,
    cache: ExpressionCache,
    state: RwLock<ServiceState>,
}

impl Default for SimpleLanguage {
    fn default() -> Self {
        Self::new(LanguageConfig::default())
    }
}

impl SimpleLanguage {
    pub fn new(config: LanguageConfig) -> Self {
        Self {
            config: Arc::new(config),
            cache: ExpressionCache::new(),
            state: RwLock::new(ServiceState::Stopped),
        }
    }

    pub fn config(&self) -> &LanguageConfig {
        &self.config
    }

    pub fn cache(&self) -> &ExpressionCache {
        &self.cache
    }

    pub fn start(&self) {
        let mut state = self.state.write();
        if *state == ServiceState::Started {
            return;
        }
        *state = ServiceState::Started;
        info!(
            "Simple language started (cache {})",
            if self.config.cache_enabled { "enabled" } else { "disabled" }
        );
    }

    pub fn stop(&self) {
        let mut state = self.state.write();
        if *state == ServiceState::Stopped {
            return;
        }
        let dropped = self.cache.len();
        self.cache.clear();
        *state = ServiceState::Stopped;
        info!("Simple language stopped ({} cached entries dropped)", dropped);
    }

    pub fn is_started(&self) -> bool {
        *self.state.read() == ServiceState::Started
    }

    /// Compile `text` as a general expression.
    pub fn compile_expression(&self, text: &str) -> CompileResult<Expression> {
        if self.config.cache_enabled {
            if let Some(cached) = self.cache.get_expression(text) {
                trace!("Expression cache hit: {}", text);
                return Ok(cached);
            }
        }

        let expression = simple::compile(text, CompileMode::Expression, &self.config)?;
        debug!("Compiled expression: {}", expression);

        if self.config.cache_enabled {
            self.cache.insert_expression(text, expression.clone());
        }
        Ok(expression)
    }

    /// Compile `text` as a predicate.
    pub fn compile_predicate(&self, text: &str) -> CompileResult<Predicate> {
        if self.config.cache_enabled {
            if let Some(cached) = self.cache.get_predicate(text) {
                trace!("Predicate cache hit: {}", text);
                return Ok(cached);
            }
        }

        let expression = simple::compile(text, CompileMode::Predicate, &self.config)?;
        let predicate = Predicate::new(expression);
        debug!("Compiled predicate: {}", predicate);

        if self.config.cache_enabled {
            self.cache.insert_predicate(text, predicate.clone());
        }
        Ok(predicate)
    }

    /// Compile in the given mode. Predicates come back as their underlying
    /// expression, which evaluates to a boolean.
    pub fn compile(&self, text: &str, mode: CompileMode) -> CompileResult<Expression> {
        match mode {
            CompileMode::Expression => self.compile_expression(text),
            CompileMode::Predicate => Ok(self.compile_predicate(text)?.expression().clone()),
        }
    }
}
