//! Demo server: a validated `notes` store and a `/sum` operation.
//!
//! ```text
//! curl -XPOST localhost:8080/notes -d '{"title":"hello","body":"world"}'
//! curl localhost:8080/notes/<id>
//! curl -XPOST localhost:8080/sum -d '{"values":[1,2,3]}'
//! ```

use async_trait::async_trait;
use clap::Parser;
use crudmux_core::{Oper, Shape, ValidationError};
use crudmux_server::{MemoryStore, NetworkModule, Registry, ServerArgs};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Note {
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    tags: Vec<String>,
}

impl Shape for Note {
    fn validate_handle(&mut self) -> Option<Result<(), ValidationError>> {
        self.title = self.title.trim().to_string();
        self.tags.retain(|t| !t.trim().is_empty());
        self.validate_value()
    }

    fn validate_value(&self) -> Option<Result<(), ValidationError>> {
        Some(if self.title.is_empty() {
            Err(ValidationError::field("title", "must not be empty"))
        } else if self.title.len() > 200 {
            Err(ValidationError::field("title", "longer than 200 bytes"))
        } else {
            Ok(())
        })
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct SumRequest {
    values: Vec<i64>,
}

impl Shape for SumRequest {}

#[derive(Debug, Serialize)]
struct SumResponse {
    total: i64,
    count: usize,
}

struct Sum;

#[async_trait]
impl Oper for Sum {
    type Request = SumRequest;
    type Response = SumResponse;

    async fn process(&self, request: SumRequest) -> anyhow::Result<SumResponse> {
        let total = request
            .values
            .iter()
            .try_fold(0i64, |acc, v| acc.checked_add(*v))
            .ok_or_else(|| anyhow::anyhow!("sum of {} values overflows", request.values.len()))?;
        Ok(SumResponse {
            total,
            count: request.values.len(),
        })
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    init_tracing(args.log_json);

    let registry = Registry::new()
        .with_store(MemoryStore::<Note>::new("notes"))
        .with_oper("/sum", Sum)?;
    info!(
        stores = ?registry.store_names(),
        operations = ?registry.oper_paths(),
        "registry populated"
    );

    let mut module = NetworkModule::new(args.network_config());
    module.start().await?;
    module
        .serve(registry, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for Ctrl-C: {err}");
                std::future::pending::<()>().await;
            }
        })
        .await
}
