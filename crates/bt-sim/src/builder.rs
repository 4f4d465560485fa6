//! Fluent builder for constructing a [`Wrangler`].

use bt_brain::{Brain, BrainStore};
use bt_core::WranglerConfig;
use bt_schedule::Registry;

use crate::{SimResult, Wrangler};

/// Fluent builder for [`Wrangler<S>`].
///
/// Brains added here are stored in insertion order (`BrainId(0)`, `BrainId(1)`,
/// …) but not started; call [`Wrangler::start`] or [`Wrangler::start_all`]
/// to schedule them.
///
/// # Example
///
/// ```rust,ignore
/// let mut wrangler = WranglerBuilder::new(config)
///     .brain(guard)
///     .brains(villagers)
///     .build()?;
/// wrangler.start_all(&mut host)?;
/// wrangler.run(&host, &mut NoopObserver)?;
/// ```
pub struct WranglerBuilder<S> {
    config: WranglerConfig,
    brains: Vec<Brain<S>>,
}

impl<S> WranglerBuilder<S> {
    pub fn new(config: WranglerConfig) -> Self {
        Self { config, brains: Vec::new() }
    }

    pub fn brain(mut self, brain: Brain<S>) -> Self {
        self.brains.push(brain);
        self
    }

    pub fn brains<I>(mut self, brains: I) -> Self
    where
        I: IntoIterator<Item = Brain<S>>,
    {
        self.brains.extend(brains);
        self
    }

    /// Validate the config, store every brain and return an idle
    /// [`Wrangler`] at tick 0.
    ///
    /// # Errors
    ///
    /// A zero tick duration, or two brains for the same agent.
    pub fn build(self) -> SimResult<Wrangler<S>> {
        self.config.validate()?;

        let mut store = BrainStore::new();
        for brain in self.brains {
            store.insert(brain)?;
        }

        Ok(Wrangler {
            clock:    self.config.make_clock(),
            config:   self.config,
            brains:   store,
            registry: Registry::new(),
        })
    }
}
