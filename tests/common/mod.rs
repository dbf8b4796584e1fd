use anyhow::{bail, Context, Result};
use registrar::db::{schema::RetryPolicy, Database, DatabaseConfig};
use secrecy::SecretString;
use std::{env, os::unix::net::UnixStream, path::Path, time::Duration};
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

const MYSQL_PORT: u16 = 3306;
const ROOT_PASSWORD: &str = "root";
const DATABASE: &str = "registration_db";

/// Whether testcontainers has a Docker API to talk to.
fn container_runtime() -> Result<()> {
    if env::var("DOCKER_HOST").is_ok() {
        return Ok(());
    }
    let socket = Path::new("/var/run/docker.sock");
    if UnixStream::connect(socket).is_ok() {
        return Ok(());
    }
    bail!("no container runtime: set DOCKER_HOST or start the Docker daemon")
}

pub struct MysqlContainer {
    _container: ContainerAsync<GenericImage>,
    host_port: u16,
}

impl MysqlContainer {
    /// Start MySQL with an empty `registration_db`.
    ///
    /// # Errors
    /// Returns an error if no container runtime is available or MySQL fails to start.
    pub async fn start() -> Result<Self> {
        container_runtime()?;

        let container = GenericImage::new("mysql", "8.4")
            .with_exposed_port(MYSQL_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr("port: 3306"))
            .with_env_var("MYSQL_ROOT_PASSWORD", ROOT_PASSWORD)
            .with_env_var("MYSQL_DATABASE", DATABASE)
            .start()
            .await
            .context("Failed to start MySQL container")?;

        let host_port = container
            .get_host_port_ipv4(MYSQL_PORT.tcp())
            .await
            .context("Failed to resolve MySQL host port")?;

        Ok(Self {
            _container: container,
            host_port,
        })
    }

    pub fn config(&self) -> DatabaseConfig {
        DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: self.host_port,
            user: "root".to_string(),
            password: SecretString::from(ROOT_PASSWORD.to_string()),
            name: DATABASE.to_string(),
        }
    }

    pub fn database(&self) -> Database {
        Database::new(&self.config())
    }
}

/// Short retry window for a container that has just reported ready.
pub fn retry_policy() -> RetryPolicy {
    RetryPolicy {
        attempts: 30,
        delay: Duration::from_millis(500),
    }
}
