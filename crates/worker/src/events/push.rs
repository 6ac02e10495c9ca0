//! Push messages and notification clicks.

use folio_client::Network;
use folio_core::Error;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::handler::OfflineWorker;

const ICON: &str = "/icons/icon-192x192.png";
const BADGE: &str = "/icons/badge-72x72.png";
const VIBRATE: [u32; 3] = [100, 50, 100];

/// The JSON a push message carries.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub primary_key: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    /// Milliseconds since the Unix epoch.
    pub date_of_arrival: i64,
    pub primary_key: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

/// A system notification to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    fn from_payload(payload: PushPayload) -> Self {
        Self {
            title: payload.title,
            body: payload.body,
            icon: ICON.into(),
            badge: BADGE.into(),
            vibrate: VIBRATE.to_vec(),
            data: NotificationData {
                date_of_arrival: chrono::Utc::now().timestamp_millis(),
                primary_key: payload.primary_key.filter(|key| *key != 0).unwrap_or(1),
            },
            actions: vec![
                NotificationAction {
                    action: "explore".into(),
                    title: "View Portfolio".into(),
                    icon: "/icons/checkmark.png".into(),
                },
                NotificationAction { action: "close".into(), title: "Close".into(), icon: "/icons/xmark.png".into() },
            ],
        }
    }
}

/// What the page host should do after a notification click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientAction {
    OpenWindow { url: Url },
}

impl<N: Network> OfflineWorker<N> {
    /// Build the notification for a push message. A message without data
    /// shows nothing.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the data is not a push payload.
    pub fn handle_push(&self, data: Option<&[u8]>) -> Result<Option<Notification>, Error> {
        let Some(data) = data else {
            tracing::debug!("push without data");
            return Ok(None);
        };
        let payload: PushPayload =
            serde_json::from_slice(data).map_err(|e| Error::InvalidInput(format!("push payload: {e}")))?;
        tracing::debug!(title = %payload.title, "showing notification");
        Ok(Some(Notification::from_payload(payload)))
    }

    /// Handle a click on a notification or one of its actions.
    ///
    /// `close` dismisses; `explore` and the notification body itself open
    /// the site root.
    pub fn handle_notification_click(&self, action: Option<&str>) -> Option<ClientAction> {
        match action {
            Some("close") => None,
            _ => Some(ClientAction::OpenWindow { url: self.origin.join("/").unwrap_or_else(|_| self.origin.clone()) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::worker_with;
    use folio_core::AppConfig;

    #[tokio::test]
    async fn test_push_builds_notification() {
        let worker = worker_with(AppConfig::default()).await;

        let notification = worker.handle_push(Some(br#"{"title":"T","body":"B"}"#)).unwrap().unwrap();

        assert_eq!(notification.title, "T");
        assert_eq!(notification.body, "B");
        assert_eq!(notification.icon, "/icons/icon-192x192.png");
        assert_eq!(notification.badge, "/icons/badge-72x72.png");
        assert_eq!(notification.vibrate, vec![100, 50, 100]);
        assert_eq!(notification.data.primary_key, 1);
        assert!(notification.data.date_of_arrival > 0);
        let actions: Vec<_> = notification.actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(actions, vec!["explore", "close"]);
    }

    #[tokio::test]
    async fn test_push_keeps_primary_key() {
        let worker = worker_with(AppConfig::default()).await;

        let notification = worker
            .handle_push(Some(br#"{"title":"New post","primaryKey":42}"#))
            .unwrap()
            .unwrap();

        assert_eq!(notification.body, "");
        assert_eq!(notification.data.primary_key, 42);
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["data"]["primaryKey"], 42);
    }

    #[tokio::test]
    async fn test_push_without_data_is_silent() {
        let worker = worker_with(AppConfig::default()).await;
        assert_eq!(worker.handle_push(None).unwrap(), None);
    }

    #[tokio::test]
    async fn test_push_malformed_payload() {
        let worker = worker_with(AppConfig::default()).await;

        let err = worker.handle_push(Some(b"not json")).unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)), "{err}");
    }

    #[tokio::test]
    async fn test_notification_click() {
        let worker = worker_with(AppConfig::default()).await;
        let root = ClientAction::OpenWindow { url: Url::parse("http://localhost:3000/").unwrap() };

        assert_eq!(worker.handle_notification_click(Some("explore")), Some(root.clone()));
        assert_eq!(worker.handle_notification_click(None), Some(root));
        assert_eq!(worker.handle_notification_click(Some("close")), None);
    }
}
