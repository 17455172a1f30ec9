// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Driver registry and active repository selection.
//!
//! ```text
//! register(driver) ──► drivers["git"]       = [git-cli, ...]
//!                      drivers["mercurial"] = [hg]
//!                      dirty = true
//!
//! open(path)
//!   sort() if dirty     descending capability score, stable
//!   round robin         git[0], mercurial[0], git[1], ...
//!     BackendUnavailable   skip
//!     other error          mark broken, skip
//!     Ok(backend)          active = backend
//!   nothing accepted    NoBackend
//! ```

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::{Backend, Driver};
use crate::credentials::Credentials;
use crate::error::{FeatureError, VcsError, VcsResult};
use crate::feature::{self, Capability, Feature, FeatureExtra, Method, Operation};

/// An enabled operation bound to the backend that provides it.
#[derive(Debug, Clone)]
pub struct BoundFeature {
    backend: Arc<dyn Backend>,
    feature: Feature,
}

impl BoundFeature {
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    #[must_use]
    pub const fn feature(&self) -> &Feature {
        &self.feature
    }

    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.feature.operation
    }
}

/// Drivers of one VCS, in probe order.
#[derive(Debug)]
struct DriverGroup {
    vcs_name: &'static str,
    drivers: Vec<Arc<dyn Driver>>,
}

/// Registers drivers and owns the active backend.
///
/// Mutated only from the thread that owns it; backends handed out are shared.
#[derive(Debug, Default)]
pub struct BackendManager {
    groups: Vec<DriverGroup>,
    broken: BTreeSet<&'static str>,
    dirty: bool,
    active: Option<Arc<dyn Backend>>,
}

impl BackendManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a driver under its VCS name.
    ///
    /// Returns `false` when the driver is marked broken.
    pub fn register(&mut self, driver: Arc<dyn Driver>) -> bool {
        if self.broken.contains(driver.name()) {
            debug!(driver = driver.name(), "skipping broken driver");
            return false;
        }
        let vcs_name = driver.vcs_name();
        debug!(driver = driver.name(), vcs = vcs_name, "registered driver");
        match self.groups.iter_mut().find(|group| group.vcs_name == vcs_name) {
            Some(group) => group.drivers.push(driver),
            None => self.groups.push(DriverGroup {
                vcs_name,
                drivers: vec![driver],
            }),
        }
        self.dirty = true;
        true
    }

    /// Orders each VCS's drivers by descending capability score.
    pub fn sort(&mut self) {
        for group in &mut self.groups {
            group
                .drivers
                .sort_by_key(|driver| std::cmp::Reverse(feature::score(driver.capabilities())));
        }
        self.dirty = false;
    }

    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Registered VCS names in registration order.
    #[must_use]
    pub fn vcs_types(&self) -> Vec<&'static str> {
        self.groups.iter().map(|group| group.vcs_name).collect()
    }

    /// VCS names with at least one driver able to create repositories.
    #[must_use]
    pub fn create_vcs_types(&self) -> Vec<&'static str> {
        self.groups
            .iter()
            .filter(|group| {
                group
                    .drivers
                    .iter()
                    .any(|driver| driver.capabilities().contains(Capability::CREATE))
            })
            .map(|group| group.vcs_name)
            .collect()
    }

    /// Driver names in probe order, `i`-th driver of every VCS in turn.
    #[must_use]
    pub fn probe_order(&self) -> Vec<&'static str> {
        self.round_robin().map(|driver| driver.name()).collect()
    }

    fn round_robin(&self) -> impl Iterator<Item = &Arc<dyn Driver>> {
        let depth = self
            .groups
            .iter()
            .map(|group| group.drivers.len())
            .max()
            .unwrap_or(0);
        (0..depth).flat_map(move |i| self.groups.iter().filter_map(move |g| g.drivers.get(i)))
    }

    #[must_use]
    pub fn broken_drivers(&self) -> Vec<&'static str> {
        self.broken.iter().copied().collect()
    }

    #[must_use]
    pub fn active(&self) -> Option<&Arc<dyn Backend>> {
        self.active.as_ref()
    }

    /// Root of the active repository.
    #[must_use]
    pub fn repodir(&self) -> Option<&Path> {
        self.active.as_deref().map(|backend| backend.repodir())
    }

    fn mark_broken(&mut self, driver: &dyn Driver, err: &VcsError) {
        warn!(driver = driver.name(), error = %err, "driver marked broken");
        self.broken.insert(driver.name());
    }

    /// Selects the first driver accepting `path`; an empty path clears the
    /// active backend.
    ///
    /// # Errors
    ///
    /// `NoBackend` when no registered driver accepts `path`.
    pub fn open(&mut self, path: &Path) -> VcsResult<Option<Arc<dyn Backend>>> {
        if path.as_os_str().is_empty() {
            debug!("cleared active backend");
            self.active = None;
            return Ok(None);
        }
        if self.dirty {
            self.sort();
        }

        let candidates: Vec<_> = self
            .round_robin()
            .filter(|driver| !self.broken.contains(driver.name()))
            .cloned()
            .collect();
        for driver in candidates {
            match driver.open(path) {
                Ok(backend) => {
                    info!(
                        driver = driver.name(),
                        repodir = %backend.repodir().display(),
                        "selected backend"
                    );
                    self.active = Some(Arc::clone(&backend));
                    return Ok(Some(backend));
                }
                Err(VcsError::BackendUnavailable(unavailable)) => {
                    debug!(driver = driver.name(), reason = %unavailable, "driver unavailable");
                }
                Err(err) => self.mark_broken(driver.as_ref(), &err),
            }
        }
        Err(VcsError::NoBackend(path.display().to_string().into_boxed_str()))
    }

    /// Creates a repository with the drivers of `vcs_name` and activates it.
    ///
    /// # Errors
    ///
    /// Argument, filesystem and authentication errors propagate at once;
    /// a not-implemented `FeatureError` when no driver of `vcs_name` can
    /// create; the last driver error when every candidate failed.
    pub fn create_with(
        &mut self,
        vcs_name: &str,
        path: &Path,
        from: Option<&str>,
        credentials: Option<Credentials>,
    ) -> VcsResult<Arc<dyn Backend>> {
        if self.dirty {
            self.sort();
        }
        let candidates: Vec<_> = self
            .groups
            .iter()
            .filter(|group| group.vcs_name == vcs_name)
            .flat_map(|group| group.drivers.iter())
            .filter(|driver| {
                driver.capabilities().contains(Capability::CREATE)
                    && !self.broken.contains(driver.name())
            })
            .cloned()
            .collect();
        if candidates.is_empty() {
            return Err(FeatureError::not_implemented(Feature::new(
                Operation::Method(Method::Create),
                false,
                FeatureExtra::new(),
            ))
            .into());
        }

        let mut last_error = None;
        for driver in candidates {
            match driver.create(path, from, credentials.clone()) {
                Ok(backend) => {
                    info!(
                        driver = driver.name(),
                        repodir = %backend.repodir().display(),
                        "created repository"
                    );
                    self.active = Some(Arc::clone(&backend));
                    return Ok(backend);
                }
                Err(
                    err @ (VcsError::InvalidArgument(_) | VcsError::Io(_) | VcsError::Auth(_)),
                ) => return Err(err),
                Err(VcsError::Feature(feature)) if !feature.feature.enabled => {
                    debug!(driver = driver.name(), "create not implemented");
                    last_error = Some(VcsError::Feature(feature));
                }
                Err(err @ VcsError::BackendUnavailable(_)) => {
                    debug!(driver = driver.name(), error = %err, "driver unavailable");
                    last_error = Some(err);
                }
                Err(err) => {
                    self.mark_broken(driver.as_ref(), &err);
                    last_error = Some(err);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| VcsError::NoBackend(path.display().to_string().into_boxed_str())))
    }

    /// Activates `driver` for `path`, bypassing ranking and broken-driver
    /// bookkeeping. The driver is not registered.
    ///
    /// # Errors
    ///
    /// Whatever `driver.open` returns.
    pub fn force_use(&mut self, driver: &dyn Driver, path: &Path) -> VcsResult<Arc<dyn Backend>> {
        let backend = driver.open(path)?;
        warn!(driver = driver.name(), "forced backend");
        self.active = Some(Arc::clone(&backend));
        Ok(backend)
    }

    /// The active backend's operation if it is enabled.
    ///
    /// `name` is a method (`commit`), a dotted accessor (`branch.set`) or a
    /// property combined with `op` (`get`, `setter`, `fdel`, ...).
    #[must_use]
    pub fn safe_check(&self, name: &str, op: Option<&str>) -> Option<BoundFeature> {
        let backend = self.active.as_ref()?;
        let operation = match op {
            Some(_) => Operation::parse(name, op).ok()?,
            None => name.parse::<Operation>().ok()?,
        };
        let feature = backend.feature(operation);
        feature.enabled.then(|| BoundFeature {
            backend: Arc::clone(backend),
            feature,
        })
    }
}
