use std::collections::BTreeMap;

use serde_json::Value;

/// Action plus the options it runs with.
#[derive(Debug, Clone)]
pub struct ActionSpec<A> {
    pub action: A,

    /// Whether a failure of this action halts the whole graph.
    pub is_critical: bool,

    /// Passed to the action unchanged.
    pub params: Option<Value>,
}

impl<A> ActionSpec<A> {
    pub fn new(action: A) -> Self {
        Self {
            action,
            is_critical: false,
            params: None,
        }
    }

    pub fn critical(mut self) -> Self {
        self.is_critical = true;
        self
    }

    pub fn with_critical(mut self, is_critical: bool) -> Self {
        self.is_critical = is_critical;
        self
    }

    pub fn with_params(mut self, params: impl Into<Value>) -> Self {
        self.params = Some(params.into());
        self
    }
}

/// A bare action is a non-critical spec without params.
impl<A> From<A> for ActionSpec<A> {
    fn from(action: A) -> Self {
        Self::new(action)
    }
}

/// How a caller describes one named task.
#[derive(Debug, Clone)]
pub enum ActionDescriptor<A> {
    /// Bare action: not critical, no params
    Action(A),

    /// Action with options
    Spec(ActionSpec<A>),

    /// Prerequisite task names followed by the action to run once they are done
    Sequence(Vec<String>, ActionSpec<A>),
}

impl<A> ActionDescriptor<A> {
    pub fn action(action: A) -> Self {
        Self::Action(action)
    }

    pub fn spec(spec: ActionSpec<A>) -> Self {
        Self::Spec(spec)
    }

    /// Run `step` after every task in `dependencies`.
    pub fn after<I, S>(dependencies: I, step: ActionSpec<A>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Sequence(dependencies.into_iter().map(Into::into).collect(), step)
    }

    /// Run a bare `action` after every task in `dependencies`.
    pub fn after_action<I, S>(dependencies: I, action: A) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::after(dependencies, ActionSpec::from(action))
    }

    pub fn dependencies(&self) -> &[String] {
        match self {
            Self::Sequence(dependencies, _) => dependencies,
            Self::Action(_) | Self::Spec(_) => &[],
        }
    }
}

impl<A: Clone> ActionDescriptor<A> {
    /// Canonical shape of this descriptor; the descriptor itself is left untouched.
    pub fn normalize(&self) -> NormalizedTask<A> {
        let (dependencies, spec) = match self {
            Self::Action(action) => (Vec::new(), ActionSpec::new(action.clone())),
            Self::Spec(spec) => (Vec::new(), spec.clone()),
            Self::Sequence(dependencies, spec) => (dependencies.clone(), spec.clone()),
        };

        NormalizedTask {
            dependencies,
            action: spec.action,
            params: spec.params,
            is_critical: spec.is_critical,
        }
    }
}

impl<A> From<ActionSpec<A>> for ActionDescriptor<A> {
    fn from(spec: ActionSpec<A>) -> Self {
        Self::Spec(spec)
    }
}

/// Descriptor after normalization.
#[derive(Debug, Clone)]
pub struct NormalizedTask<A> {
    pub dependencies: Vec<String>,
    pub action: A,
    pub params: Option<Value>,
    pub is_critical: bool,
}

/// Task name -> descriptor, the input of both entry points.
#[derive(Debug, Clone)]
pub struct ActionMap<A> {
    tasks: BTreeMap<String, ActionDescriptor<A>>,
}

impl<A> Default for ActionMap<A> {
    fn default() -> Self {
        Self {
            tasks: BTreeMap::new(),
        }
    }
}

impl<A> ActionMap<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn task(mut self, name: impl Into<String>, descriptor: ActionDescriptor<A>) -> Self {
        self.insert(name, descriptor);
        self
    }

    /// Returns the descriptor previously registered under `name`, if any.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        descriptor: ActionDescriptor<A>,
    ) -> Option<ActionDescriptor<A>> {
        self.tasks.insert(name.into(), descriptor)
    }

    pub fn get(&self, name: &str) -> Option<&ActionDescriptor<A>> {
        self.tasks.get(name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActionDescriptor<A>)> {
        self.tasks.iter().map(|(name, d)| (name.as_str(), d))
    }
}

impl<A, K: Into<String>> FromIterator<(K, ActionDescriptor<A>)> for ActionMap<A> {
    fn from_iter<I: IntoIterator<Item = (K, ActionDescriptor<A>)>>(iter: I) -> Self {
        Self {
            tasks: iter
                .into_iter()
                .map(|(name, d)| (name.into(), d))
                .collect(),
        }
    }
}
