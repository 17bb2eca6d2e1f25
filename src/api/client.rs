use crate::api::{error::Result, experiment::Experiment, options::*};

/// Operations on MLflow experiments, emulating namespaces on top of the
/// flat experiment space of the server.
///
/// Every operation reads its input from and writes its result back into
/// the caller's [`Experiment`].
#[rustfmt::skip]
pub trait Client {
    /// Creates `experiment` in the namespace of `options`.
    ///
    /// `name` must be set. On success all server computed fields are filled in.
    fn create_experiment(&self, experiment: &mut Experiment, options: &CreateOptions) -> Result<()>;
    /// Fetches the experiment with the `experiment_id` of `experiment`.
    fn get_experiment(&self, experiment: &mut Experiment, options: &GetOptions) -> Result<()>;
    /// Fetches the experiment with the `name` of `experiment` in the namespace of `options`.
    fn get_experiment_by_name(&self, experiment: &mut Experiment, options: &GetOptions) -> Result<()>;
    /// Deletes the experiment with the `experiment_id` of `experiment` and
    /// resets `experiment` to its default value.
    fn delete_experiment(&self, experiment: &mut Experiment, options: &DeleteOptions) -> Result<()>;
    /// Updates name, tags and lifecycle stage of the experiment identified by
    /// `experiment_id`, or by `name` if no id is set.
    ///
    /// Not atomic: each changed field is its own request, and changes sent
    /// before a failing request stay applied on the server.
    fn update_experiment(&self, experiment: &mut Experiment) -> Result<()>;
    /// Lists the experiments of a namespace.
    ///
    /// Namespaces containing `'` are rejected before any request is sent.
    fn list_experiments(&self, options: &ListOptions) -> Result<Vec<Experiment>>;
}
