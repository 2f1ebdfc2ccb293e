//! The synthesis pipeline: allocate, schedule, bind, and when the bound
//! design does not fit the area limit, trim and run schedule and bind once
//! more.
use crate::{
    allocate::{
        clamp_op_instances, trim_to_budget, Allocation, Allocator,
        IlpAllocator, MinAreaAllocator, PerfAllocator, Provisioning,
    },
    bind::{Binder, ExclusiveBinder, SharedBinder},
    schedule::{
        BaselineScheduler, Limit, ListScheduler, Scheduler, SdcScheduler,
    },
    traversal::{help_line, Named},
};
use hls_ir::{HlsInput, Solution};
use hls_utils::{Error, HlsResult};
use itertools::Itertools;
use std::{fmt, str::FromStr, time::Instant};

/// Run `f` and log how long it took.
fn timed<T>(
    phase: &str,
    strategy: &str,
    f: impl FnOnce() -> HlsResult<T>,
) -> HlsResult<T> {
    let start = Instant::now();
    let out = f()?;
    let elapsed = start.elapsed();
    if elapsed.as_secs() > 5 {
        log::warn!("{phase} ({strategy}): {}ms", elapsed.as_millis());
    } else {
        log::info!("{phase} ({strategy}): {}ms", elapsed.as_millis());
    }
    Ok(out)
}

fn unknown(what: &str, name: &str, known: &[&str]) -> Error {
    Error::misc(format!(
        "unknown {what} `{name}`, expected one of: {}",
        known.iter().join(", ")
    ))
}

/// Defines a strategy selector enum that parses from and prints as the
/// names of its strategies.
macro_rules! strategy_kind {
    ($(#[$meta:meta])* $kind:ident, $what:literal, { $($variant:ident => $strategy:ty),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub enum $kind {
            $($variant),+
        }

        impl $kind {
            pub const ALL: &'static [$kind] = &[$($kind::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $($kind::$variant => <$strategy>::name()),+
                }
            }

            fn help() -> Vec<String> {
                vec![$(help_line::<$strategy>()),+]
            }
        }

        impl fmt::Display for $kind {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $kind {
            type Err = Error;

            fn from_str(s: &str) -> HlsResult<Self> {
                $kind::ALL
                    .iter()
                    .copied()
                    .find(|kind| kind.name() == s)
                    .ok_or_else(|| {
                        let known = $kind::ALL.iter().map(|k| k.name()).collect_vec();
                        unknown($what, s, &known)
                    })
            }
        }
    };
}

strategy_kind!(
    /// Resource allocation strategies.
    AllocatorKind, "allocator", {
        MinArea => MinAreaAllocator,
        Perf => PerfAllocator,
        Ilp => IlpAllocator,
    }
);

strategy_kind!(
    /// Scheduling strategies.
    SchedulerKind, "scheduler", {
        Baseline => BaselineScheduler,
        List => ListScheduler,
        Sdc => SdcScheduler,
    }
);

strategy_kind!(
    /// Binding strategies.
    BinderKind, "binder", {
        Exclusive => ExclusiveBinder,
        Shared => SharedBinder,
    }
);

fn allocate_with<A: Allocator>(
    mut alloc: A,
    input: &HlsInput,
) -> HlsResult<Allocation> {
    timed("allocate", A::name(), || alloc.allocate(input))
}

fn schedule_with<S: Scheduler>(
    mut sched: S,
    input: &HlsInput,
    sol: &Solution,
    limit: Limit,
) -> HlsResult<Vec<Option<u32>>> {
    timed("schedule", S::name(), || sched.schedule(input, sol, limit))
}

fn bind_with<B: Binder>(
    mut binder: B,
    input: &HlsInput,
    sol: &Solution,
) -> HlsResult<Vec<Option<u32>>> {
    timed("bind", B::name(), || binder.bind(input, sol))
}

impl AllocatorKind {
    pub fn allocate(self, input: &HlsInput) -> HlsResult<Allocation> {
        match self {
            AllocatorKind::MinArea => allocate_with(MinAreaAllocator, input),
            AllocatorKind::Perf => allocate_with(PerfAllocator, input),
            AllocatorKind::Ilp => allocate_with(IlpAllocator, input),
        }
    }
}

impl SchedulerKind {
    pub fn schedule(
        self,
        input: &HlsInput,
        sol: &Solution,
        limit: Limit,
    ) -> HlsResult<Vec<Option<u32>>> {
        match self {
            SchedulerKind::Baseline => {
                schedule_with(BaselineScheduler, input, sol, limit)
            }
            SchedulerKind::List => {
                schedule_with(ListScheduler, input, sol, limit)
            }
            SchedulerKind::Sdc => {
                schedule_with(SdcScheduler::default(), input, sol, limit)
            }
        }
    }
}

impl BinderKind {
    pub fn bind(
        self,
        input: &HlsInput,
        sol: &Solution,
    ) -> HlsResult<Vec<Option<u32>>> {
        match self {
            BinderKind::Exclusive => bind_with(ExclusiveBinder, input, sol),
            BinderKind::Shared => bind_with(SharedBinder, input, sol),
        }
    }
}

/// The strategies a [Pipeline] runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    pub allocator: AllocatorKind,
    pub scheduler: SchedulerKind,
    pub binder: BinderKind,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            allocator: AllocatorKind::Ilp,
            scheduler: SchedulerKind::Sdc,
            binder: BinderKind::Shared,
        }
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.allocator, self.scheduler, self.binder)
    }
}

/// Parses `allocator/scheduler/binder`, e.g. `ilp/sdc/shared`.
impl FromStr for PipelineConfig {
    type Err = Error;

    fn from_str(s: &str) -> HlsResult<Self> {
        let Some((alloc, sched, bind)) = s.split('/').collect_tuple() else {
            return Err(Error::misc(format!(
                "expected `allocator/scheduler/binder`, got `{s}`"
            )));
        };
        Ok(PipelineConfig {
            allocator: alloc.parse()?,
            scheduler: sched.parse()?,
            binder: bind.parse()?,
        })
    }
}

/// Description of every strategy, grouped by pass.
pub fn strategy_help() -> String {
    let mut out = String::new();
    for (pass, lines) in [
        ("Allocators", AllocatorKind::help()),
        ("Schedulers", SchedulerKind::help()),
        ("Binders", BinderKind::help()),
    ] {
        out.push_str(pass);
        out.push_str(":\n");
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// Runs the passes in sequence over one input.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline { config }
    }

    /// Synthesize `input`. Any pass failure aborts the run; no partial
    /// solution is returned.
    pub fn run(&self, input: &HlsInput) -> HlsResult<Solution> {
        log::info!("pipeline: {}", self.config);
        let mut sol = Solution::new(input);

        let alloc = self.config.allocator.allocate(input)?;
        let limit = match alloc.provisioning {
            Provisioning::Fixed => Limit::Provisioned,
            Provisioning::Tentative => Limit::Unlimited,
        };
        alloc.commit(&mut sol);
        self.schedule_and_bind(input, &mut sol, limit)?;

        let budget = u64::from(input.library.area_limit);
        let area = sol.area(input);
        if area <= budget {
            return Ok(sol);
        }

        log::info!(
            "bound design needs area {area}, the limit is {budget}: trimming and rescheduling"
        );
        trim_to_budget(input, &sol.op_resource, &mut sol.resource_instances)?;
        clamp_op_instances(
            input,
            &sol.op_resource,
            &sol.resource_instances,
            &mut sol.op_instances,
        );
        sol.clear_schedule();
        self.schedule_and_bind(input, &mut sol, Limit::Provisioned)?;

        let area = sol.area(input);
        if area > budget {
            return Err(Error::budget(format!(
                "design still needs area {area} after trimming, the limit is {budget}"
            )));
        }
        Ok(sol)
    }

    fn schedule_and_bind(
        &self,
        input: &HlsInput,
        sol: &mut Solution,
        limit: Limit,
    ) -> HlsResult<()> {
        sol.schedule = self.config.scheduler.schedule(input, sol, limit)?;
        sol.binding = self.config.binder.bind(input, sol)?;
        sol.recount_instances(input);
        log::debug!(
            "instances {:?}, area {}",
            sol.resource_instances,
            sol.area(input)
        );
        Ok(())
    }
}
