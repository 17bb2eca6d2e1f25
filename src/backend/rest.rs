use crate::{
    api::{
        client::Client,
        error::{Error, Result},
        experiment::{Experiment, LifecycleStage},
        check_namespace,
        options::{CreateOptions, DeleteOptions, GetOptions, ListOptions, ViewType},
        qualified_name,
        tag::Tags,
        DEFAULT_NAMESPACE, NAMESPACE_TAG,
    },
    backend::{
        config::ServerConfig,
        transport::{HttpRequest, Method, Transport, UreqTransport},
    },
    ExperimentId,
};
use anyhow::Context;
use serde::{de::{DeserializeOwned, IgnoredAny}, Deserialize, Serialize};
use tracing::{debug, info, instrument};

const API_PREFIX: &str = "api/2.0/mlflow";

/// Hook that may modify every outgoing request, e.g. to attach credentials.
pub type Authenticator = Box<dyn Fn(&mut HttpRequest) + Send + Sync>;

/// An authenticator sending `Authorization: Bearer <token>`.
pub fn bearer_token(token: impl Into<String>) -> Authenticator {
    let value = format!("Bearer {}", token.into());
    Box::new(move |request: &mut HttpRequest| request.set_header("Authorization", value.as_str()))
}

/// [`Client`] for the REST API of a MLflow tracking server.
pub struct Server {
    api_url: String,
    transport: Box<dyn Transport>,
    authenticator: Option<Authenticator>,
}

impl Server {
    /// Connects to `address`, e.g. `http://127.0.0.1:5000`, using a default [`UreqTransport`].
    pub fn new(address: &str) -> Result<Self> {
        Server::from_config(&ServerConfig::new(address))
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let mut transport = UreqTransport::new();
        if let Some(timeout) = config.timeout {
            transport = transport.with_timeout(timeout);
        }
        Server::build(config, Box::new(transport))
    }

    pub fn with_transport(address: &str, transport: impl Transport + 'static) -> Result<Self> {
        Server::build(&ServerConfig::new(address), Box::new(transport))
    }

    fn build(config: &ServerConfig, transport: Box<dyn Transport>) -> Result<Self> {
        let address = config.validate()?;
        Ok(Server {
            api_url: format!("{}/{}", address, API_PREFIX),
            transport,
            authenticator: None,
        })
    }

    pub fn with_authenticator(mut self, authenticator: impl Fn(&mut HttpRequest) + Send + Sync + 'static) -> Self {
        self.authenticator = Some(Box::new(authenticator));
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn build_request<Ep: Endpoint>(&self, request: &Ep) -> Result<HttpRequest> {
        let url = format!("{}/{}", self.api_url, Ep::PATH);
        let mut http_request = match Ep::METHOD {
            Method::Get => {
                let query = serde_qs::to_string(request)
                    .context("as query string")
                    .map_err(Error::Encode)?;
                let url = if query.is_empty() { url } else { format!("{}?{}", url, query) };
                HttpRequest::new(Method::Get, url)
            }
            Method::Post => {
                let body = serde_json::to_string(request)
                    .context("as json")
                    .map_err(Error::Encode)?;
                let mut http_request = HttpRequest::new(Method::Post, url);
                http_request.set_header("Content-Type", "application/json");
                http_request.body = Some(body);
                http_request
            }
        };
        http_request.set_header("Accept", "application/json");
        if let Some(authenticate) = &self.authenticator {
            authenticate(&mut http_request);
        }
        Ok(http_request)
    }

    fn execute<Ep: Endpoint>(&self, request: &Ep) -> Result<Ep::Value> {
        let http_request = self.build_request(request)?;
        debug!(method = %http_request.method, url = %http_request.url, "sending request");
        let http_response = self.transport.send(&http_request).map_err(Error::Transport)?;
        debug!(status = http_response.status, "received response");
        if http_response.status != 200 {
            return Err(Error::Status {
                status: http_response.status,
                body: http_response.body,
            });
        }
        let body = match http_response.body.trim() {
            "" => "{}",
            body => body,
        };
        let response = serde_json::from_str::<Ep::Response>(body)?;
        Ok(Ep::extract(response))
    }

    /// Fills `experiment` from the experiment of the same name, if there is one.
    fn adopt_existing(&self, experiment: &mut Experiment, namespace: &str, error: Error) -> Result<()> {
        let mut existing = Experiment::new(experiment.name.clone());
        match self.get_experiment_by_name(&mut existing, &GetOptions::in_namespace(namespace)) {
            Ok(()) => {
                info!(experiment_id = %existing.experiment_id, "experiment already exists");
                existing.deep_copy_into(experiment);
                Ok(())
            }
            Err(lookup) => {
                debug!(%lookup, "no existing experiment to fall back to");
                Err(error)
            }
        }
    }
}

impl Client for Server {
    #[instrument(skip_all, fields(name = %experiment.name, namespace = options.namespace()))]
    fn create_experiment(&self, experiment: &mut Experiment, options: &CreateOptions) -> Result<()> {
        if experiment.name.is_empty() {
            return Err(Error::MissingAttribute("Name"));
        }
        let namespace = options.namespace();
        check_namespace(namespace)?;
        let name = qualified_name(namespace, &experiment.name);
        let mut tags = experiment.tags.clone();
        tags.set(NAMESPACE_TAG, namespace);
        let request = CreateExperiment {
            name: &name,
            artifact_location: &experiment.artifact_location,
            tags: &tags,
        };
        let experiment_id = match self.execute(&request) {
            Ok(experiment_id) => experiment_id,
            Err(error @ Error::Status { .. }) if options.ignore_already_exists => {
                return self.adopt_existing(experiment, namespace, error);
            }
            Err(error) => return Err(error),
        };
        info!(%experiment_id, "created experiment");
        experiment.experiment_id = experiment_id;
        self.get_experiment(experiment, &GetOptions::in_namespace(namespace))
    }

    #[instrument(skip_all, fields(experiment_id = %experiment.experiment_id))]
    fn get_experiment(&self, experiment: &mut Experiment, _options: &GetOptions) -> Result<()> {
        if experiment.experiment_id.is_empty() {
            return Err(Error::MissingAttribute("ExperimentID"));
        }
        let request = GetExperiment {
            experiment_id: &experiment.experiment_id,
        };
        let fetched = self.execute(&request)?;
        fetched.deep_copy_into(experiment);
        experiment.strip_namespace();
        Ok(())
    }

    #[instrument(skip_all, fields(name = %experiment.name, namespace = options.namespace()))]
    fn get_experiment_by_name(&self, experiment: &mut Experiment, options: &GetOptions) -> Result<()> {
        if experiment.name.is_empty() {
            return Err(Error::MissingAttribute("Name"));
        }
        let name = qualified_name(options.namespace(), &experiment.name);
        let request = GetExperimentByName { experiment_name: &name };
        let fetched = self.execute(&request)?;
        fetched.deep_copy_into(experiment);
        experiment.strip_namespace();
        Ok(())
    }

    #[instrument(skip_all, fields(experiment_id = %experiment.experiment_id))]
    fn delete_experiment(&self, experiment: &mut Experiment, options: &DeleteOptions) -> Result<()> {
        if experiment.experiment_id.is_empty() {
            return Err(Error::MissingAttribute("ExperimentID"));
        }
        let request = DeleteExperiment {
            experiment_id: &experiment.experiment_id,
        };
        match self.execute(&request) {
            Ok(()) => {}
            Err(error) if error.is_not_found() && options.ignore_missing => {
                debug!("experiment is already gone");
            }
            Err(error) => return Err(error),
        }
        Experiment::default().deep_copy_into(experiment);
        Ok(())
    }

    #[instrument(skip_all, fields(experiment_id = %experiment.experiment_id, name = %experiment.name))]
    fn update_experiment(&self, experiment: &mut Experiment) -> Result<()> {
        let namespace = match experiment.namespace() {
            "" => DEFAULT_NAMESPACE,
            namespace => namespace,
        };
        let options = GetOptions::in_namespace(namespace);
        let mut stored = Experiment {
            experiment_id: experiment.experiment_id.clone(),
            name: experiment.name.clone(),
            ..Default::default()
        };
        if !stored.experiment_id.is_empty() {
            self.get_experiment(&mut stored, &options)?;
        } else if !stored.name.is_empty() {
            self.get_experiment_by_name(&mut stored, &options)?;
        } else {
            return Err(Error::MissingAttribute("ExperimentID"));
        }
        let experiment_id = &stored.experiment_id;

        if !experiment.name.is_empty() && experiment.name != stored.name {
            let new_name = match stored.namespace() {
                "" => experiment.name.clone(),
                namespace => qualified_name(namespace, &experiment.name),
            };
            debug!(%new_name, "renaming experiment");
            self.execute(&RenameExperiment {
                experiment_id,
                new_name: &new_name,
            })?;
        }

        for tag in experiment.tags.iter().filter(|tag| tag.key != NAMESPACE_TAG) {
            if stored.tags.contains(&tag.key) && stored.tags.get(&tag.key) == tag.value {
                continue;
            }
            debug!(key = %tag.key, "setting tag");
            self.execute(&SetExperimentTag {
                experiment_id,
                key: &tag.key,
                value: &tag.value,
            })?;
        }

        match (experiment.lifecycle_stage, stored.lifecycle_stage) {
            (Some(LifecycleStage::Deleted), current) if current != Some(LifecycleStage::Deleted) => {
                self.execute(&DeleteExperiment { experiment_id })?;
            }
            (Some(LifecycleStage::Active), Some(LifecycleStage::Deleted)) => {
                self.execute(&RestoreExperiment { experiment_id })?;
            }
            _ => {}
        }

        experiment.experiment_id = stored.experiment_id.clone();
        self.get_experiment(experiment, &options)
    }

    #[instrument(skip_all, fields(namespace = options.namespace()))]
    fn list_experiments(&self, options: &ListOptions) -> Result<Vec<Experiment>> {
        check_namespace(options.namespace())?;
        let filter = format!("tags.`{}` = '{}'", NAMESPACE_TAG, options.namespace());
        let request = SearchExperiments {
            max_results: options.max_results,
            view_type: options.view_type,
            filter: &filter,
        };
        let mut experiments = self.execute(&request)?;
        for experiment in &mut experiments {
            experiment.strip_namespace();
        }
        debug!(count = experiments.len(), "listed experiments");
        Ok(experiments)
    }
}

trait Endpoint: Serialize {
    const PATH: &'static str;
    const METHOD: Method;

    type Response: DeserializeOwned;
    type Value;

    fn extract(response: Self::Response) -> Self::Value;
}
trait VoidEndpoint: Serialize {
    const PATH: &'static str;
    const METHOD: Method;
}
impl<E> Endpoint for E
where
    E: VoidEndpoint,
{
    const PATH: &'static str = <E as VoidEndpoint>::PATH;
    const METHOD: Method = <E as VoidEndpoint>::METHOD;

    type Response = IgnoredAny;
    type Value = ();

    fn extract(_response: Self::Response) -> Self::Value {}
}

#[derive(Debug, Clone, Copy, Serialize)]
struct CreateExperiment<'a> {
    pub name: &'a str,
    pub artifact_location: &'a str,
    pub tags: &'a Tags,
}
#[derive(Deserialize)]
struct CreateExperimentResponse {
    experiment_id: ExperimentId,
}
impl Endpoint for CreateExperiment<'_> {
    const PATH: &'static str = "experiments/create";
    const METHOD: Method = Method::Post;
    type Response = CreateExperimentResponse;
    type Value = ExperimentId;

    fn extract(response: Self::Response) -> Self::Value {
        response.experiment_id
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
struct GetExperiment<'a> {
    pub experiment_id: &'a ExperimentId,
}
#[derive(Deserialize)]
struct GetExperimentResponse {
    experiment: Experiment,
}
impl Endpoint for GetExperiment<'_> {
    const PATH: &'static str = "experiments/get";
    const METHOD: Method = Method::Get;
    type Response = GetExperimentResponse;
    type Value = Experiment;

    fn extract(response: Self::Response) -> Self::Value {
        response.experiment
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
struct GetExperimentByName<'a> {
    pub experiment_name: &'a str,
}
impl Endpoint for GetExperimentByName<'_> {
    const PATH: &'static str = "experiments/get-by-name";
    const METHOD: Method = Method::Get;
    type Response = GetExperimentResponse;
    type Value = Experiment;

    fn extract(response: Self::Response) -> Self::Value {
        response.experiment
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
struct DeleteExperiment<'a> {
    pub experiment_id: &'a ExperimentId,
}
impl VoidEndpoint for DeleteExperiment<'_> {
    const PATH: &'static str = "experiments/delete";
    const METHOD: Method = Method::Post;
}

#[derive(Debug, Clone, Copy, Serialize)]
struct RestoreExperiment<'a> {
    pub experiment_id: &'a ExperimentId,
}
impl VoidEndpoint for RestoreExperiment<'_> {
    const PATH: &'static str = "experiments/restore";
    const METHOD: Method = Method::Post;
}

#[derive(Debug, Clone, Copy, Serialize)]
struct RenameExperiment<'a> {
    pub experiment_id: &'a ExperimentId,
    pub new_name: &'a str,
}
impl VoidEndpoint for RenameExperiment<'_> {
    const PATH: &'static str = "experiments/update";
    const METHOD: Method = Method::Post;
}

#[derive(Debug, Clone, Copy, Serialize)]
struct SetExperimentTag<'a> {
    pub experiment_id: &'a ExperimentId,
    pub key: &'a str,
    pub value: &'a str,
}
impl VoidEndpoint for SetExperimentTag<'_> {
    const PATH: &'static str = "experiments/set-experiment-tag";
    const METHOD: Method = Method::Post;
}

#[derive(Debug, Clone, Copy, Serialize)]
struct SearchExperiments<'a> {
    pub max_results: u32,
    pub view_type: ViewType,
    pub filter: &'a str,
}
#[derive(Deserialize)]
struct SearchExperimentsResponse {
    #[serde(default)]
    experiments: Vec<Experiment>,
}
impl Endpoint for SearchExperiments<'_> {
    const PATH: &'static str = "experiments/search";
    const METHOD: Method = Method::Post;
    type Response = SearchExperimentsResponse;
    type Value = Vec<Experiment>;

    fn extract(response: Self::Response) -> Self::Value {
        response.experiments
    }
}
