use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::UserId;
use crate::domain::identity::models::VerificationToken;

const SUBJECT: &str = "Email Verification";
const TOKEN_PARAM: &str = "token=";

/// Rendered activation message, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationEmail {
    pub recipient: String,
    pub subject: String,
    pub link: String,
    pub body: String,
}

impl ActivationEmail {
    /// Build the message pointing at `{app_url}/auth/verify`.
    pub fn render(
        app_url: &str,
        user_id: &UserId,
        recipient: &EmailAddress,
        token: &VerificationToken,
    ) -> Self {
        let link = format!(
            "{}/auth/verify?id={}&token={}",
            app_url.trim_end_matches('/'),
            user_id,
            token.as_str()
        );
        let body = format!(
            "Hi there,\n\nPlease activate your account by opening the link below:\n{}\n\nCheers",
            link
        );

        Self {
            recipient: recipient.as_str().to_string(),
            subject: SUBJECT.to_string(),
            link,
            body,
        }
    }

    /// Activation link with the verification token masked, for logs.
    pub fn redacted_link(&self) -> String {
        match self.link.split_once(TOKEN_PARAM) {
            Some((head, _)) => format!("{}{}***", head, TOKEN_PARAM),
            None => self.link.clone(),
        }
    }
}
