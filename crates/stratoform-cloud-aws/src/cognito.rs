//! Cognito user pool, hosted domain and app clients

use crate::provider::AwsProvider;
use stratoform_cloud::{CloudError, Output, Properties, ResourceOptions, Result, Stack, logical_name};

const USER_POOL: &str = "aws:cognito:UserPool";
const USER: &str = "aws:cognito:User";
const USER_POOL_DOMAIN: &str = "aws:cognito:UserPoolDomain";
const USER_POOL_CLIENT: &str = "aws:cognito:UserPoolClient";
const MANAGED_USER_POOL_CLIENT: &str = "aws:cognito:ManagedUserPoolClient";

/// Stack setting holding the password of the provisioned user
pub(crate) const USERPASS_KEY: &str = "config:userpass";

impl AwsProvider {
    pub(crate) fn register_user_pool(&mut self, stack: &mut Stack) -> Result<()> {
        let userpass_key = self
            .settings
            .require_secret(USERPASS_KEY)
            .map_err(|e| CloudError::MissingSetting(e.to_string()))?;
        let pool_conf = &self.config.authorizer.user_pool;
        let client_conf = &pool_conf.user_client;

        let user_pool = stack.register(
            USER_POOL,
            &logical_name(&pool_conf.name),
            Properties::new().with("name", &pool_conf.name),
            ResourceOptions::new(),
        )?;

        let password = stack.secret_config(userpass_key);
        stack.register(
            USER,
            "user",
            Properties::new()
                .with("enabled", true)
                .with("password", password)
                .with("userPoolId", user_pool.id())
                .with("username", &pool_conf.user.username)
                .with_opt(
                    "attributes",
                    (!pool_conf.user.email.is_empty())
                        .then(|| Properties::new().with("email", &pool_conf.user.email)),
                ),
            ResourceOptions::depends_on([&user_pool]),
        )?;

        let domain = stack.register(
            USER_POOL_DOMAIN,
            &logical_name(&pool_conf.user_domain.name),
            Properties::new()
                .with("domain", &pool_conf.user_domain.name)
                .with("userPoolId", user_pool.id()),
            ResourceOptions::depends_on([&user_pool]),
        )?;

        let client = stack.register(
            USER_POOL_CLIENT,
            &logical_name(&client_conf.name),
            Properties::new()
                .with("name", &client_conf.name)
                .with("userPoolId", user_pool.id())
                .with_strings("explicitAuthFlows", &client_conf.explicit_auth_flows)
                .with_strings("callbackUrls", &client_conf.callback_urls)
                .with_strings("allowedOauthScopes", &client_conf.allowed_scopes)
                .with_strings("allowedOauthFlows", &client_conf.allowed_flows)
                .with("generateSecret", true),
            ResourceOptions::depends_on([&user_pool]),
        )?;

        stack.register(
            MANAGED_USER_POOL_CLIENT,
            "managed",
            Properties::new()
                .with("namePattern", &client_conf.name)
                .with_strings("allowedOauthFlows", &client_conf.allowed_flows)
                .with_strings("allowedOauthScopes", &client_conf.allowed_scopes)
                .with_strings("callbackUrls", &client_conf.callback_urls)
                .with_strings("explicitAuthFlows", &client_conf.explicit_auth_flows)
                .with("supportedIdentityProviders", Output::strings(["COGNITO"]))
                .with("userPoolId", user_pool.id()),
            ResourceOptions::depends_on([&user_pool]),
        )?;

        stack.export("CognitoUserPoolClientId", client.id());
        stack.export("CognitoUserPoolDomain", domain.attr("domain"));

        tracing::info!(user_pool = %pool_conf.name, "Cognito user pool registered");
        self.user_pool = Some(user_pool);
        Ok(())
    }
}
