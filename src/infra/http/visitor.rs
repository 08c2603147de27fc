use std::{convert::Infallible, net::SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header::USER_AGENT, request::Parts},
};

use crate::domain::{identity::Identity, tracking::TrackingId};

/// Everything the board handlers know about the caller.
///
/// Each part is optional: identity is absent when authentication is disabled,
/// the tracking id outside the tracking middleware, and the remote address when
/// the server was not started with connect info.
#[derive(Debug, Clone, Default)]
pub(crate) struct Visitor {
    pub(crate) identity: Option<Identity>,
    pub(crate) tracking: Option<TrackingId>,
    pub(crate) remote_addr: Option<SocketAddr>,
    pub(crate) user_agent: Option<String>,
}

impl Visitor {
    pub(crate) fn user_label(&self) -> &str {
        self.identity.as_ref().map_or("-", Identity::as_str)
    }

    pub(crate) fn tracking_label(&self) -> &str {
        self.tracking.as_ref().map_or("-", TrackingId::as_str)
    }

    pub(crate) fn remote_label(&self) -> String {
        self.remote_addr
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    pub(crate) fn user_agent_label(&self) -> &str {
        self.user_agent.as_deref().unwrap_or("-")
    }
}

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            identity: parts.extensions.get::<Identity>().cloned(),
            tracking: parts.extensions.get::<TrackingId>().cloned(),
            remote_addr: parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
            user_agent: parts
                .headers
                .get(USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
        })
    }
}
