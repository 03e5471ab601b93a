use crate::config::EmailConfig;
use crate::sender::ChannelSender;
use alert_core::location::Location;
use alert_core::match_result::Match;
use alert_core::severity::Severity;
use alert_core::warning::Warning;
use anyhow::{bail, Context};
use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Minor => "#3B82F6",
        Severity::Moderate => "#EAB308",
        Severity::Severe => "#EF4444",
        Severity::Extreme => "#1F2937",
    }
}

/// Process-level SMTP defaults; a channel's own config overrides these field by
/// field, mirroring the original's `_resolve_smtp`.
#[derive(Debug, Clone, Default)]
pub struct SmtpDefaults {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_addr: String,
}

pub struct EmailSender {
    defaults: SmtpDefaults,
}

impl EmailSender {
    pub fn new(defaults: SmtpDefaults) -> Self {
        Self { defaults }
    }

    fn resolve(&self, config: &EmailConfig) -> SmtpDefaults {
        SmtpDefaults {
            host: config.smtp_host.clone().unwrap_or_else(|| self.defaults.host.clone()),
            port: config.smtp_port.unwrap_or(if self.defaults.port == 0 {
                587
            } else {
                self.defaults.port
            }),
            user: config.smtp_user.clone().unwrap_or_else(|| self.defaults.user.clone()),
            password: config
                .smtp_password
                .clone()
                .unwrap_or_else(|| self.defaults.password.clone()),
            from_addr: self.defaults.from_addr.clone(),
        }
    }

    fn build_html(warning: &Warning, location: &Location, is_trial: bool) -> (String, String) {
        let label = if location.label.is_empty() {
            &location.kecamatan
        } else {
            &location.label
        };
        let color = severity_color(warning.severity);
        let subject = format!("[BMKG Alert] {}: {} — {label}", warning.severity, warning.event);

        let description = if !warning.description.is_empty() {
            warning.description.clone()
        } else {
            warning.headline.clone()
        };
        let description = crate::formatter::truncate(&description, 500);

        let infographic_html = if !warning.infographic_url.is_empty() {
            format!(
                "<p><a href=\"{}\" style=\"color:#2563EB;\">Lihat Infografis BMKG</a></p>",
                warning.infographic_url
            )
        } else {
            String::new()
        };

        let trial_html = if is_trial {
            "<p style=\"color:#6B7280;font-size:12px;margin-top:16px;\">Mode Trial — notifikasi aktif sementara.</p>"
                .to_string()
        } else {
            String::new()
        };

        let html = format!(
            r#"<div style="font-family:sans-serif;max-width:600px;margin:0 auto;">
  <div style="background:{color};color:white;padding:16px 20px;border-radius:8px 8px 0 0;">
    <h2 style="margin:0;">Peringatan Cuaca — {}</h2>
    <p style="margin:4px 0 0;opacity:0.9;">{}</p>
  </div>
  <div style="border:1px solid #E5E7EB;border-top:none;padding:20px;border-radius:0 0 8px 8px;">
    <table style="width:100%;font-size:14px;border-collapse:collapse;">
      <tr><td style="padding:6px 0;color:#6B7280;width:120px;">Lokasi</td><td style="padding:6px 0;font-weight:600;">{label}</td></tr>
      <tr><td style="padding:6px 0;color:#6B7280;">Wilayah</td><td style="padding:6px 0;">{}, {}, {}</td></tr>
      <tr><td style="padding:6px 0;color:#6B7280;">Berlaku</td><td style="padding:6px 0;">{}</td></tr>
      <tr><td style="padding:6px 0;color:#6B7280;">Hingga</td><td style="padding:6px 0;">{}</td></tr>
    </table>
    <p style="margin-top:16px;color:#374151;">{description}</p>
    {infographic_html}
    {trial_html}
    <hr style="border:none;border-top:1px solid #E5E7EB;margin:16px 0;" />
    <p style="font-size:12px;color:#9CA3AF;">Sumber: BMKG (bmkg.go.id) | BMKG Alert System</p>
  </div>
</div>"#,
            warning.event,
            warning.severity,
            location.kecamatan,
            location.kabupaten,
            location.province,
            non_empty(&warning.effective),
            non_empty(&warning.expires),
        );

        (subject, html)
    }
}

fn non_empty(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    async fn send(
        &self,
        warning: &Warning,
        location: &Location,
        _matched: &Match,
        config: &serde_json::Value,
        is_trial: bool,
    ) -> anyhow::Result<()> {
        let config: EmailConfig =
            serde_json::from_value(config.clone()).context("email channel config")?;
        let smtp = self.resolve(&config);
        if smtp.host.is_empty() || smtp.user.is_empty() {
            bail!("smtp not configured");
        }

        let (subject, html) = Self::build_html(warning, location, is_trial);

        let message = Message::builder()
            .from(smtp.from_addr.parse().context("invalid from address")?)
            .to(config.to_email.parse().context("invalid to address")?)
            .subject(subject)
            .header(lettre::message::header::ContentType::TEXT_HTML)
            .body(html)
            .context("build email message")?;

        let creds = Credentials::new(smtp.user.clone(), smtp.password.clone());
        let transport = if smtp.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)?.credentials(creds)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?.credentials(creds)
        }
        .port(smtp.port)
        .build();

        transport.send(message).await.context("send smtp message")?;
        Ok(())
    }
}
