pub mod managed_workload;

pub use managed_workload::{
    KIND, ManagedWorkload, ManagedWorkloadSpec, WorkloadKey,
};
