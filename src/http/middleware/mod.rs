pub mod origin;

pub use origin::origin_policy_middleware;
