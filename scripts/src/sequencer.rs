//! The deployment sequencer: resolves an execution order over a set of
//! named deployment steps and runs each step at most once.
//!
//! Deployment transactions are submitted strictly sequentially; each
//! step's action is awaited to completion before the next is issued,
//! since later steps causally depend on addresses and state produced by
//! earlier ones.

use std::{
    collections::{HashMap, HashSet},
    future::Future,
    path::Path,
    pin::Pin,
};

use tracing::{error, info};

use crate::{
    errors::ScriptError,
    registry::DeploymentRegistry,
    types::{NetworkContext, ReleaseConfig, StepOutput},
};

/// The future returned by a deployment step's action
pub type StepFuture = Pin<Box<dyn Future<Output = Result<StepOutput, ScriptError>>>>;

/// A deployment step's action.
///
/// Receives the read-only release config and a snapshot of the registry
/// as of the step's execution; the orchestrator alone mutates the
/// authoritative registry.
pub type StepAction = Box<dyn Fn(ReleaseConfig, DeploymentRegistry) -> StepFuture>;

/// A skip predicate, evaluated once against the network context before
/// any step executes
pub type SkipPredicate = Box<dyn Fn(&NetworkContext) -> bool>;

/// A named deployment step with its dependencies, action, and scheduling flags
pub struct DeploymentStep {
    /// The unique name of the step
    name: String,
    /// The names of the steps that must complete before this one
    dependencies: Vec<String>,
    /// Whether the step is deferred past all non-deferred steps
    run_last: bool,
    /// The optional skip predicate
    skip: Option<SkipPredicate>,
    /// The step's action
    action: StepAction,
}

impl DeploymentStep {
    /// A new step with the given name and action
    pub fn new<A>(name: impl Into<String>, action: A) -> Self
    where
        A: Fn(ReleaseConfig, DeploymentRegistry) -> StepFuture + 'static,
    {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            run_last: false,
            skip: None,
            action: Box::new(action),
        }
    }

    /// Declare the steps that must complete before this one
    pub fn depends_on(mut self, dependencies: &[&str]) -> Self {
        self.dependencies = dependencies.iter().map(|d| d.to_string()).collect();
        self
    }

    /// Defer the step past all non-deferred steps
    pub fn run_last(mut self) -> Self {
        self.run_last = true;
        self
    }

    /// Attach a skip predicate to the step
    pub fn skip_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&NetworkContext) -> bool + 'static,
    {
        self.skip = Some(Box::new(predicate));
        self
    }

    /// The name of the step
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A report of what a deployment run did
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    /// The steps whose actions were executed, in execution order
    pub executed: Vec<String>,
    /// The steps whose existing handles were reused
    pub reused: Vec<String>,
    /// The steps that were skipped by their predicates
    pub skipped: Vec<String>,
}

/// The deployment sequencer.
///
/// Holds the declared steps for one release and executes them in a
/// dependency-respecting order, recording produced handles in the
/// deployment registry.
#[derive(Default)]
pub struct Sequencer {
    /// The declared steps, in declaration order
    steps: Vec<DeploymentStep>,
}

impl Sequencer {
    /// An empty sequencer
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step, rejecting duplicate names
    pub fn add_step(&mut self, step: DeploymentStep) -> Result<(), ScriptError> {
        if self.steps.iter().any(|s| s.name == step.name) {
            return Err(ScriptError::DuplicateStep(step.name));
        }

        self.steps.push(step);
        Ok(())
    }

    /// Resolve the execution order of the declared steps.
    ///
    /// Every step is placed strictly after all of its declared
    /// dependencies. Ties among independent steps are broken by
    /// declaration order, and steps flagged `run_last` are deferred
    /// until no unflagged step is ready. Dependencies naming steps not
    /// declared in this run do not constrain the order; whether they
    /// are satisfied by a prior deployment is checked at execution
    /// time.
    ///
    /// A dependency cycle is rejected here, before any step executes.
    pub fn resolve_order(&self) -> Result<Vec<usize>, ScriptError> {
        let n = self.steps.len();
        let index_of: HashMap<&str, usize> = self
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| (step.name.as_str(), i))
            .collect();

        // indegree counts only edges between declared steps
        let mut indegree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, step) in self.steps.iter().enumerate() {
            for dep in &step.dependencies {
                if let Some(&j) = index_of.get(dep.as_str()) {
                    indegree[i] += 1;
                    dependents[j].push(i);
                }
            }
        }

        let mut placed = vec![false; n];
        let mut order = Vec::with_capacity(n);
        while order.len() < n {
            // Among ready steps, prefer the first unflagged one in
            // declaration order; fall back to deferred steps only once
            // no unflagged step is ready
            let ready =
                |i: &usize| !placed[*i] && indegree[*i] == 0 && !self.steps[*i].run_last;
            let ready_deferred = |i: &usize| !placed[*i] && indegree[*i] == 0;
            let next = (0..n).find(ready).or_else(|| (0..n).find(ready_deferred));

            let i = match next {
                Some(i) => i,
                None => {
                    let remaining = self
                        .steps
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| !placed[*i])
                        .map(|(_, step)| step.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    return Err(ScriptError::CyclicDependency(remaining));
                }
            };

            placed[i] = true;
            order.push(i);
            for &dependent in &dependents[i] {
                indegree[dependent] -= 1;
            }
        }

        Ok(order)
    }

    /// Run the declared steps against the given config and registry.
    ///
    /// Skip predicates are evaluated once up front and the full order
    /// is resolved before anything executes, so a cyclic graph performs
    /// no partial work. A step whose name already has a registry handle
    /// is not re-deployed; its existing handle is reused. Each produced
    /// handle is recorded and, if a persistence path is given, written
    /// to disk immediately, so a failed run leaves completed
    /// deployments in place for retry.
    pub async fn run(
        &self,
        config: &ReleaseConfig,
        registry: &mut DeploymentRegistry,
        persist_path: Option<&Path>,
    ) -> Result<RunReport, ScriptError> {
        let skipped: Vec<bool> = self
            .steps
            .iter()
            .map(|step| {
                step.skip
                    .as_ref()
                    .map(|predicate| predicate(&config.network))
                    .unwrap_or(false)
            })
            .collect();
        let order = self.resolve_order()?;

        let mut completed: HashSet<&str> = HashSet::new();
        let mut report = RunReport::default();
        for i in order {
            let step = &self.steps[i];
            if skipped[i] {
                info!("skipping step `{}`", step.name);
                report.skipped.push(step.name.clone());
                continue;
            }

            if registry.contains(&step.name) {
                info!(
                    "step `{}` already deployed at {:#x}, reusing",
                    step.name,
                    registry.address(&step.name)?,
                );
                completed.insert(step.name.as_str());
                report.reused.push(step.name.clone());
                continue;
            }

            // A skipped step satisfies its dependents only through a
            // prior recorded deployment
            for dep in &step.dependencies {
                if !completed.contains(dep.as_str()) && !registry.contains(dep) {
                    return Err(ScriptError::MissingDependency(format!(
                        "step `{}` requires `{}`, which was skipped or never deployed",
                        step.name, dep
                    )));
                }
            }

            info!("running step `{}`", step.name);
            let output = match (step.action)(config.clone(), registry.clone()).await {
                Ok(output) => output,
                Err(e) => {
                    error!("step `{}` failed: {}", step.name, e);
                    return Err(e);
                }
            };

            if let StepOutput::Contract(handle) = output {
                info!("step `{}` deployed at {:#x}", step.name, handle.address);
                registry.record(&step.name, handle)?;
                if let Some(path) = persist_path {
                    registry.save(path)?;
                }
            }

            completed.insert(step.name.as_str());
            report.executed.push(step.name.clone());
        }

        Ok(report)
    }
}
