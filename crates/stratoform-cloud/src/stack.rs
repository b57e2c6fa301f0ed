//! Desired-state resource graph
//!
//! Providers register resources here instead of calling cloud APIs. The graph
//! keeps registration order, explicit `dependsOn` edges, data-source invokes,
//! secret config declarations and exported outputs. The engine computes
//! ordering, diffing and apply from it.

use crate::error::{CloudError, Result};
use crate::output::{Output, Properties};
use std::collections::{BTreeMap, HashMap};

/// Handle to a registered resource or invoke result
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    name: String,
    token: String,
}

impl ResourceRef {
    /// Logical name in the program
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type token (resource type or invoked function)
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Provider-assigned ID
    pub fn id(&self) -> Output {
        self.attr("id")
    }

    /// Attribute reference, resolved by the engine
    pub fn attr(&self, property: &str) -> Output {
        Output::reference(&self.name, Some(property))
    }
}

/// Resource options
#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    pub depends_on: Vec<ResourceRef>,
}

impl ResourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with explicit dependencies
    pub fn depends_on<'a, I>(resources: I) -> Self
    where
        I: IntoIterator<Item = &'a ResourceRef>,
    {
        Self {
            depends_on: resources.into_iter().cloned().collect(),
        }
    }
}

/// A registered resource
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub name: String,
    pub token: String,
    pub properties: Properties,
    pub depends_on: Vec<String>,
}

/// A data-source function call whose result is referenced by resources
#[derive(Debug, Clone, PartialEq)]
pub struct Invoke {
    pub name: String,
    pub function: String,
    pub arguments: Properties,
}

/// A config value the program expects from the stack settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDecl {
    pub key: String,
    pub secret: bool,
}

/// Resource graph of one stack
#[derive(Debug, Clone, Default)]
pub struct Stack {
    project: String,
    stack: String,
    resources: Vec<Resource>,
    index: HashMap<String, usize>,
    invokes: Vec<Invoke>,
    config: Vec<ConfigDecl>,
    outputs: BTreeMap<String, Output>,
}

impl Stack {
    pub fn new(project: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            stack: stack.into(),
            ..Default::default()
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn stack_name(&self) -> &str {
        &self.stack
    }

    /// Register a resource and return its handle
    pub fn register(
        &mut self,
        token: &str,
        name: &str,
        properties: Properties,
        options: ResourceOptions,
    ) -> Result<ResourceRef> {
        self.claim_name(name)?;

        let mut depends_on: Vec<String> = Vec::with_capacity(options.depends_on.len());
        for dep in options.depends_on {
            if !self.index.contains_key(&dep.name) {
                return Err(CloudError::InvalidConfig(format!(
                    "{} depends on unregistered resource {}",
                    name, dep.name
                )));
            }
            if !depends_on.contains(&dep.name) {
                depends_on.push(dep.name);
            }
        }

        tracing::debug!(token, name, deps = depends_on.len(), "Registering resource");

        self.index.insert(name.to_string(), self.resources.len());
        self.resources.push(Resource {
            name: name.to_string(),
            token: token.to_string(),
            properties,
            depends_on,
        });

        Ok(ResourceRef {
            name: name.to_string(),
            token: token.to_string(),
        })
    }

    /// Declare a data-source invoke; its result is referenced like a resource
    pub fn invoke(&mut self, name: &str, function: &str, arguments: Properties) -> Result<ResourceRef> {
        if self.invokes.iter().any(|i| i.name == name) {
            return Err(CloudError::ResourceAlreadyExists(name.to_string()));
        }
        self.claim_name(name)?;

        tracing::debug!(function, name, "Declaring invoke");
        self.invokes.push(Invoke {
            name: name.to_string(),
            function: function.to_string(),
            arguments,
        });

        Ok(ResourceRef {
            name: name.to_string(),
            token: function.to_string(),
        })
    }

    /// Reference a secret stack setting by its namespaced key, e.g. `config:userpass`
    pub fn secret_config(&mut self, key: &str) -> Output {
        if !self.config.iter().any(|c| c.key == key) {
            self.config.push(ConfigDecl {
                key: key.to_string(),
                secret: true,
            });
        }
        Output::config(key)
    }

    /// Export a named stack output; re-exporting a name replaces it
    pub fn export(&mut self, name: &str, value: impl Into<Output>) {
        self.outputs.insert(name.to_string(), value.into());
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.index.get(name).map(|&i| &self.resources[i])
    }

    /// Resources in registration order
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Resources of one type, in registration order
    pub fn resources_of_type<'a>(&'a self, token: &'a str) -> impl Iterator<Item = &'a Resource> {
        self.resources.iter().filter(move |r| r.token == token)
    }

    pub fn invokes(&self) -> &[Invoke] {
        &self.invokes
    }

    pub fn config_decls(&self) -> &[ConfigDecl] {
        &self.config
    }

    pub fn outputs(&self) -> &BTreeMap<String, Output> {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.invokes.is_empty() && self.outputs.is_empty()
    }

    fn claim_name(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.index.contains_key(name) || self.invokes.iter().any(|i| i.name == name) {
            return Err(CloudError::ResourceAlreadyExists(name.to_string()));
        }
        Ok(())
    }
}

fn is_reserved(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | '$' | '{' | '}')
}

/// Program key for a name taken from the template
///
/// Cloud names such as `logs.example.com` are fine as property values but a
/// `.` would split a `${name.attr}` reference, so reserved characters become
/// `-`. The literal value stays in the resource properties.
pub fn logical_name(value: &str) -> String {
    value
        .chars()
        .map(|c| if is_reserved(c) { '-' } else { c })
        .collect()
}

/// Logical names become interpolation targets and must stay unambiguous
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CloudError::InvalidConfig(
            "resource name must not be empty".to_string(),
        ));
    }
    if let Some(c) = name.chars().find(|c| is_reserved(*c)) {
        return Err(CloudError::InvalidConfig(format!(
            "resource name {:?} contains {:?}",
            name, c
        )));
    }
    Ok(())
}
