//! Named units of work.

use std::fmt;

use crate::error::Result;

/// Side-effecting body of a task.
pub type TaskBody<C> = Box<dyn Fn(&mut C) -> Result<()>>;

/// A named unit of work with ordered prerequisites.
///
/// Tasks are immutable once declared. The executor runs each body at most
/// once per invocation.
pub struct Task<C> {
    name: String,
    description: String,
    depends_on: Vec<String>,
    body: TaskBody<C>,
}

impl<C> Task<C> {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut C) -> Result<()> + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            depends_on: Vec::new(),
            body: Box::new(body),
        }
    }

    /// A task with no body of its own, used to group prerequisites.
    pub fn group<I, S>(name: impl Into<String>, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, |_| Ok(())).depends_on(depends_on)
    }

    pub fn depends_on<I, S>(mut self, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = depends_on.into_iter().map(Into::into).collect();
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Prerequisites in declaration order.
    #[inline]
    pub fn prerequisites(&self) -> &[String] {
        &self.depends_on
    }

    pub(crate) fn run(&self, ctx: &mut C) -> Result<()> {
        (self.body)(ctx)
    }
}

impl<C> fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}
