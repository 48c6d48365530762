pub mod deployment;
pub mod error;
pub mod extract;
pub mod http;
pub mod middleware;
pub mod routes;

#[cfg(test)]
pub mod test_support;

pub type DeploymentImpl = deployment::LocalDeployment;
