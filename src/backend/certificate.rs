use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use thiserror::Error;

use crate::backend::quiz::QuizRecord;

const WIDTH: u32 = 1120;
const HEIGHT: u32 = 790;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CertificateError {
    #[error("Certificate has no course name")]
    MissingCourseName,
    #[error("Score {0} is not a passing score")]
    NotPassed(u8),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Certificate {
    pub recipient: Option<String>,
    pub course_name: String,
    pub completion_date: NaiveDate,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CertificateExport {
    pub file_name: String,
    pub data_url: String,
}

impl Certificate {
    /// Only passing attempts earn a certificate.
    pub fn issue(record: &QuizRecord, recipient: Option<&str>) -> Option<Self> {
        let summary = record.summary();
        if !summary.passed {
            return None;
        }
        Some(Self {
            recipient: recipient.map(str::to_string),
            course_name: record.course_title.clone(),
            completion_date: record.completed_at.date_naive(),
            score: summary.score,
        })
    }

    pub fn formatted_date(&self) -> String {
        self.completion_date.format("%B %-d, %Y").to_string()
    }

    pub fn file_name(&self) -> String {
        let slug: String = self
            .course_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        let slug = slug
            .split('-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        format!("certificate-{slug}-{}.svg", self.completion_date.format("%Y-%m-%d"))
    }

    pub fn render_svg(&self) -> String {
        let recipient = self.recipient.as_deref().unwrap_or("Course Participant");
        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<rect width="{w}" height="{h}" fill="#fdfbf5"/>
<rect x="24" y="24" width="{iw}" height="{ih}" fill="none" stroke="#1e3a5f" stroke-width="6"/>
<rect x="40" y="40" width="{iw2}" height="{ih2}" fill="none" stroke="#c9a227" stroke-width="2"/>
<text x="{cx}" y="170" text-anchor="middle" font-family="Georgia, serif" font-size="54" fill="#1e3a5f">Certificate of Completion</text>
<text x="{cx}" y="250" text-anchor="middle" font-family="Helvetica, Arial, sans-serif" font-size="22" fill="#555">This certifies that</text>
<text x="{cx}" y="330" text-anchor="middle" font-family="Georgia, serif" font-size="44" fill="#111">{recipient}</text>
<text x="{cx}" y="400" text-anchor="middle" font-family="Helvetica, Arial, sans-serif" font-size="22" fill="#555">has successfully completed</text>
<text x="{cx}" y="470" text-anchor="middle" font-family="Georgia, serif" font-size="36" fill="#1e3a5f">{course}</text>
<text x="{cx}" y="560" text-anchor="middle" font-family="Helvetica, Arial, sans-serif" font-size="22" fill="#333">Score: {score}%</text>
<text x="{cx}" y="610" text-anchor="middle" font-family="Helvetica, Arial, sans-serif" font-size="20" fill="#333">Completed on {date}</text>
</svg>"##,
            w = WIDTH,
            h = HEIGHT,
            iw = WIDTH - 48,
            ih = HEIGHT - 48,
            iw2 = WIDTH - 80,
            ih2 = HEIGHT - 80,
            cx = WIDTH / 2,
            recipient = escape_xml(recipient),
            course = escape_xml(&self.course_name),
            score = self.score,
            date = self.formatted_date(),
        )
    }

    /// Encodes the rendered certificate as a downloadable data URL.
    pub fn export(&self) -> Result<CertificateExport, CertificateError> {
        if self.course_name.trim().is_empty() {
            return Err(CertificateError::MissingCourseName);
        }
        if self.score < crate::backend::quiz::PASSING_SCORE {
            return Err(CertificateError::NotPassed(self.score));
        }
        let svg = self.render_svg();
        Ok(CertificateExport {
            file_name: self.file_name(),
            data_url: format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg)),
        })
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::quiz::{ChoiceKey, QuizResult};
    use chrono::{TimeZone, Utc};

    fn record(correct: usize, total: usize) -> QuizRecord {
        QuizRecord {
            course_id: "c1".into(),
            course_title: "Anti-Money Laundering & KYC".into(),
            completed_at: Utc.with_ymd_and_hms(2026, 3, 9, 14, 30, 0).unwrap(),
            results: (0..total)
                .map(|i| QuizResult {
                    question: format!("Q{i}"),
                    user_answer: ChoiceKey::A,
                    correct_answer: ChoiceKey::A,
                    is_correct: i < correct,
                })
                .collect(),
        }
    }

    #[test]
    fn test_only_passing_attempts_are_certified() {
        assert!(Certificate::issue(&record(3, 5), Some("Lee")).is_none());

        let cert = Certificate::issue(&record(4, 5), Some("Lee")).expect("Passing attempt should certify");
        assert_eq!(cert.score, 80);
        assert_eq!(cert.course_name, "Anti-Money Laundering & KYC");
        assert_eq!(cert.formatted_date(), "March 9, 2026");
    }

    #[test]
    fn test_svg_escapes_text() {
        let cert = Certificate::issue(&record(5, 5), Some("<script>")).unwrap();
        let svg = cert.render_svg();
        assert!(svg.contains("Anti-Money Laundering &amp; KYC"));
        assert!(svg.contains("&lt;script&gt;"));
        assert!(svg.contains("Score: 100%"));
        assert!(!svg.contains("<script>"));
    }

    #[test]
    fn test_export() {
        let cert = Certificate::issue(&record(5, 5), None).unwrap();
        let export = cert.export().expect("Failed to export");
        assert_eq!(export.file_name, "certificate-anti-money-laundering-kyc-2026-03-09.svg");
        let encoded = export.data_url.strip_prefix("data:image/svg+xml;base64,").unwrap();
        let decoded = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
        assert!(decoded.contains("Course Participant"));
    }

    #[test]
    fn test_export_failures() {
        let mut cert = Certificate::issue(&record(5, 5), None).unwrap();
        cert.score = 50;
        assert_eq!(cert.export(), Err(CertificateError::NotPassed(50)));
        cert.score = 90;
        cert.course_name = "  ".into();
        assert_eq!(cert.export(), Err(CertificateError::MissingCourseName));
    }
}
