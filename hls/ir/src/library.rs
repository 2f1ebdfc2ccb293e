use crate::OpTypeId;
use hls_utils::{Error, HlsResult};
use serde::Deserialize;

/// Description of a type of hardware resource (a functional unit template).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourceType {
    pub area: u32,
    #[serde(default)]
    pub sequential: bool,
    /// Cycles until the result is available; 0 if combinational.
    #[serde(default)]
    pub latency: u32,
    /// A pipelined resource accepts a new operation every cycle (II = 1).
    #[serde(default)]
    pub pipelined: bool,
    /// Propagation delay in ns.
    #[serde(default)]
    pub delay: f64,
    /// Operation types this resource can implement.
    pub compatible: Vec<OpTypeId>,
}

impl ResourceType {
    /// A combinational resource.
    pub fn combinational<I>(area: u32, delay: f64, compatible: I) -> Self
    where
        I: IntoIterator<Item = OpTypeId>,
    {
        ResourceType {
            area,
            sequential: false,
            latency: 0,
            pipelined: false,
            delay,
            compatible: compatible.into_iter().collect(),
        }
    }

    /// A sequential resource with the given latency.
    pub fn sequential<I>(
        area: u32,
        latency: u32,
        pipelined: bool,
        delay: f64,
        compatible: I,
    ) -> Self
    where
        I: IntoIterator<Item = OpTypeId>,
    {
        ResourceType {
            area,
            sequential: true,
            latency,
            pipelined,
            delay,
            compatible: compatible.into_iter().collect(),
        }
    }

    /// Combinational resources have no latency and cannot be pipelined.
    fn normalize(&mut self) {
        if !self.sequential {
            self.latency = 0;
            self.pipelined = false;
        }
    }

    #[inline]
    pub fn is_compatible(&self, ot: OpTypeId) -> bool {
        self.compatible.contains(&ot)
    }

    /// Minimum distance between the start cycles of two operations issued
    /// back to back on the same instance.
    #[inline]
    pub fn occupancy(&self) -> u32 {
        if self.pipelined {
            1
        } else {
            self.latency + 1
        }
    }

    /// Do operations starting at cycles `a` and `b` compete for the same
    /// instance of this resource?
    #[inline]
    pub fn overlaps(&self, a: u32, b: u32) -> bool {
        if self.pipelined {
            a == b
        } else {
            a.abs_diff(b) < self.latency + 1
        }
    }
}

/// The resource library: available resource types and global constraints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "LibraryDef")]
pub struct ResourceLibrary {
    /// Target clock period in ns.
    pub target_cp: f64,
    /// Upper bound on the total area of all resource instances.
    pub area_limit: u32,
    pub resources: Vec<ResourceType>,
}

#[derive(Deserialize)]
struct LibraryDef {
    target_cp: f64,
    area_limit: u32,
    resources: Vec<ResourceType>,
}

impl TryFrom<LibraryDef> for ResourceLibrary {
    type Error = Error;
    fn try_from(def: LibraryDef) -> HlsResult<Self> {
        ResourceLibrary::new(def.target_cp, def.area_limit, def.resources)
    }
}

impl ResourceLibrary {
    pub fn new(
        target_cp: f64,
        area_limit: u32,
        mut resources: Vec<ResourceType>,
    ) -> HlsResult<Self> {
        if !(target_cp.is_finite() && target_cp > 0.0) {
            return Err(Error::malformed(format!(
                "target clock period must be positive, got {target_cp}"
            )));
        }
        resources.iter_mut().for_each(ResourceType::normalize);
        Ok(ResourceLibrary {
            target_cp,
            area_limit,
            resources,
        })
    }

    /// Warn about resources that cannot produce a result within one clock
    /// period. Chaining is not modeled so these never meet timing.
    pub fn check_timing(&self) -> usize {
        let mut violations = 0;
        for (rtid, rt) in self.resources.iter().enumerate() {
            if rt.delay > self.target_cp {
                log::warn!(
                    "resource type {rtid}: delay {}ns exceeds the target clock period {}ns",
                    rt.delay,
                    self.target_cp
                );
                violations += 1;
            }
        }
        violations
    }
}
