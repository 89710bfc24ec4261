use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Method, StatusCode, Url,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{sync::Arc, time::Duration};
use typed_builder::TypedBuilder;

use domain_snapshot::{
    model::vo::{
        Actor, LiveChannel, LiveMember, LiveRole, NewChannel, NewRole, WorkspaceProfile,
    },
    service::DirectoryService,
};

use super::dto;

const AUDIT_LOG_REASON: &str = "X-Audit-Log-Reason";
const MEMBER_PAGE_SIZE: usize = 1000;

/// A guild reached through the Discord REST API as a bot.
#[derive(TypedBuilder)]
pub struct DiscordDirectory {
    client: Arc<reqwest::Client>,
    api_base: Url,
    #[builder(setter(into))]
    token: String,
    #[builder(setter(into))]
    guild_id: String,
    #[builder(default = 15_000)]
    timeout_ms: u64,
    #[builder(default = 5)]
    max_attempts: u64,
}

fn encode_reason(reason: &str) -> String {
    url::form_urlencoded::byte_serialize(reason.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

impl DiscordDirectory {
    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.api_base
            .join(path)
            .with_context(|| format!("Invalid API path: {path}"))
    }

    /// Sends one API call, retrying transport errors, timeouts, 5xx and 429
    /// until `max_attempts` is used up. 4xx other than 429 fail right away.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        reason: Option<&str>,
    ) -> anyhow::Result<reqwest::Response> {
        let url = self.url(path)?;
        let mut times = 1u64;
        loop {
            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .header(AUTHORIZATION, format!("Bot {}", self.token));
            if let Some(reason) = reason {
                request = request.header(AUDIT_LOG_REASON, encode_reason(reason));
            }
            if let Some(body) = &body {
                request = request
                    .header(CONTENT_TYPE, "application/json")
                    .body(body.clone());
            }
            let failure = tokio::select! {
                x = request.send() => {
                    match x {
                        Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                            let retry_after = response
                                .json::<dto::RateLimited>()
                                .await
                                .map(|el| el.retry_after)
                                .unwrap_or(1.0);
                            if times >= self.max_attempts {
                                bail!("{method} {path} is still rate limited after {times} attempts");
                            }
                            tracing::debug!(%method, path, retry_after, "Rate limited, waiting.");
                            tokio::time::sleep(Duration::from_secs_f64(retry_after.max(0.0))).await;
                            times += 1;
                            continue;
                        }
                        Ok(response) if response.status().is_server_error() => {
                            anyhow!("{method} {path} failed with {}", response.status())
                        }
                        Ok(response) if response.status().is_client_error() => {
                            let status = response.status();
                            let text = response.text().await.unwrap_or_default();
                            bail!("{method} {path} failed with {status}: {text}");
                        }
                        Ok(response) => break Ok(response),
                        Err(e) => anyhow!(e).context(format!("{method} {path} failed")),
                    }
                }
                _ = tokio::time::sleep(Duration::from_millis(self.timeout_ms)) => {
                    anyhow!("{method} {path} timed out")
                }
            };
            if times >= self.max_attempts {
                return Err(failure);
            }
            tracing::debug!(%method, path, times, "Retrying request: {failure:#}");
            backoff(times).await;
            times += 1;
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let response = self.execute(Method::GET, path, None, None).await?;
        response
            .json()
            .await
            .with_context(|| format!("Unexpected response body from GET {path}"))
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        reason: &str,
    ) -> anyhow::Result<T> {
        let body = serde_json::to_vec(body)?;
        let response = self
            .execute(method.clone(), path, Some(body), Some(reason))
            .await?;
        response
            .json()
            .await
            .with_context(|| format!("Unexpected response body from {method} {path}"))
    }

    async fn send_empty(&self, method: Method, path: &str, reason: &str) -> anyhow::Result<()> {
        self.execute(method, path, None, Some(reason)).await?;
        Ok(())
    }

    /// The bot account acting on the guild.
    pub async fn current_user(&self) -> anyhow::Result<Actor> {
        let user: dto::User = self.get("users/@me").await?;
        Ok(Actor::new(user.id.to_owned(), user.tag()))
    }

    /// Turns an icon reference into the data URI the API expects.
    async fn icon_data(&self, icon_ref: &str) -> anyhow::Result<String> {
        if icon_ref.starts_with("data:") {
            return Ok(icon_ref.to_owned());
        }
        let response = self
            .client
            .get(icon_ref)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("Failed to download icon {icon_ref}"))?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|el| el.to_str().ok())
            .unwrap_or("image/png")
            .to_owned();
        let bytes = response.bytes().await?;
        Ok(format!("data:{content_type};base64,{}", STANDARD.encode(bytes)))
    }
}

async fn backoff(times: u64) {
    let jitter = rand::random::<u8>() as u64;
    tokio::time::sleep(Duration::from_millis(500 * times + jitter)).await;
}

#[async_trait]
impl DirectoryService for DiscordDirectory {
    async fn profile(&self) -> anyhow::Result<WorkspaceProfile> {
        let guild: dto::Guild = self.get(&format!("guilds/{}", self.guild_id)).await?;
        Ok(WorkspaceProfile {
            icon_ref: guild.icon_url(),
            id: guild.id,
            name: guild.name,
        })
    }

    async fn roles(&self) -> anyhow::Result<Vec<LiveRole>> {
        let roles: Vec<dto::Role> = self.get(&format!("guilds/{}/roles", self.guild_id)).await?;
        Ok(roles
            .into_iter()
            .map(|el| el.into_live(&self.guild_id))
            .collect())
    }

    async fn channels(&self) -> anyhow::Result<Vec<LiveChannel>> {
        let channels: Vec<dto::Channel> =
            self.get(&format!("guilds/{}/channels", self.guild_id)).await?;
        Ok(channels.into_iter().map(Into::into).collect())
    }

    async fn members(&self) -> anyhow::Result<Vec<LiveMember>> {
        let mut members: Vec<LiveMember> = vec![];
        let mut after = "0".to_string();
        loop {
            let page: Vec<dto::Member> = self
                .get(&format!(
                    "guilds/{}/members?limit={MEMBER_PAGE_SIZE}&after={after}",
                    self.guild_id
                ))
                .await?;
            let count = page.len();
            members.extend(page.into_iter().map(LiveMember::from));
            match members.last() {
                Some(last) if count == MEMBER_PAGE_SIZE => after = last.id.to_owned(),
                _ => break,
            }
        }
        Ok(members)
    }

    async fn authority_position(&self) -> anyhow::Result<i64> {
        let me: dto::User = self.get("users/@me").await?;
        let member: dto::Member = self
            .get(&format!("guilds/{}/members/{}", self.guild_id, me.id))
            .await?;
        let roles = self.roles().await?;
        Ok(roles
            .iter()
            .filter(|el| member.roles.contains(&el.id))
            .map(|el| el.position)
            .max()
            .unwrap_or_default())
    }

    async fn set_identity(&self, name: &str, icon_ref: Option<String>) -> anyhow::Result<()> {
        let icon = match icon_ref {
            Some(icon_ref) => Some(self.icon_data(&icon_ref).await?),
            None => None,
        };
        let _: serde_json::Value = self
            .send(
                Method::PATCH,
                &format!("guilds/{}", self.guild_id),
                &dto::ModifyGuild {
                    name: name.to_owned(),
                    icon,
                },
                "Snapshot restore: identity",
            )
            .await?;
        Ok(())
    }

    async fn create_role(&self, role: NewRole) -> anyhow::Result<String> {
        let created: dto::Created = self
            .send(
                Method::POST,
                &format!("guilds/{}/roles", self.guild_id),
                &dto::CreateRole {
                    name: role.name,
                    permissions: role.permissions.to_string(),
                    color: role.color,
                    hoist: role.hoist,
                    mentionable: role.mentionable,
                },
                &role.reason,
            )
            .await?;
        Ok(created.id)
    }

    async fn delete_role(&self, id: &str, reason: &str) -> anyhow::Result<()> {
        self.send_empty(
            Method::DELETE,
            &format!("guilds/{}/roles/{id}", self.guild_id),
            reason,
        )
        .await
    }

    async fn create_channel(&self, channel: NewChannel) -> anyhow::Result<String> {
        let created: dto::Created = self
            .send(
                Method::POST,
                &format!("guilds/{}/channels", self.guild_id),
                &dto::CreateChannel {
                    name: channel.name,
                    kind: dto::kind_to_wire(channel.kind),
                    position: channel.position,
                    parent_id: channel.parent_id,
                    topic: channel.topic,
                    nsfw: channel.nsfw,
                    rate_limit_per_user: channel.slow_mode_seconds,
                    bitrate: channel.bitrate,
                    user_limit: channel.user_limit,
                    permission_overwrites: channel.overwrites.iter().map(Into::into).collect(),
                },
                &channel.reason,
            )
            .await?;
        Ok(created.id)
    }

    async fn delete_channel(&self, id: &str, reason: &str) -> anyhow::Result<()> {
        self.send_empty(Method::DELETE, &format!("channels/{id}"), reason)
            .await
    }

    async fn grant_roles(
        &self,
        member_id: &str,
        role_ids: &[String],
        reason: &str,
    ) -> anyhow::Result<()> {
        let mut failed = vec![];
        for role_id in role_ids {
            let path = format!("guilds/{}/members/{member_id}/roles/{role_id}", self.guild_id);
            if let Err(e) = self.send_empty(Method::PUT, &path, reason).await {
                tracing::debug!(member_id, %role_id, "Role grant failed: {e:#}");
                failed.push(role_id.as_str());
            }
        }
        if !failed.is_empty() {
            bail!(
                "Failed to grant {} of {} roles: {}",
                failed.len(),
                role_ids.len(),
                failed.join(", ")
            );
        }
        Ok(())
    }
}
