use crate::environment::command_exists;
use crate::executor::{self, DEFAULT_TIMEOUT};
use crate::{Result, ScanError};
use chrono::Local;
use log::{debug, info, warn};
use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;
use std::path::{Path, PathBuf};

/// Result of the XML-to-HTML conversion chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertOutcome {
    /// An HTML sibling was produced; carries the strategy that succeeded.
    Converted(&'static str),
    /// Every strategy was exhausted. The XML artifact remains usable.
    Unavailable,
}

/// Conversion strategies in priority order. Each is tried only if the
/// previous one failed and its prerequisite tool is present.
#[derive(Debug, Clone, Copy)]
enum Strategy {
    /// XSLT through the JVM against the bundled stylesheet jar.
    Xalan,
    /// Standalone XSLT processor; its stdout becomes the HTML file.
    Xsltproc,
    /// Self-generated minimal report parsed straight from the XML.
    Builtin,
}

impl Strategy {
    const CHAIN: [Strategy; 3] = [Strategy::Xalan, Strategy::Xsltproc, Strategy::Builtin];

    fn name(&self) -> &'static str {
        match self {
            Strategy::Xalan => "xalan",
            Strategy::Xsltproc => "xsltproc",
            Strategy::Builtin => "builtin",
        }
    }

    fn available(&self) -> bool {
        match self {
            Strategy::Xalan => command_exists("java"),
            Strategy::Xsltproc => command_exists("xsltproc"),
            Strategy::Builtin => true,
        }
    }
}

/// Converts scanner XML artifacts into HTML reports.
pub struct Converter {
    reports_dir: PathBuf,
}

impl Converter {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    /// Walk the strategy chain until one produces the `.html` sibling of
    /// `xml_path`. This never fails the surrounding task: when everything is
    /// exhausted the caller is told no HTML was produced and the XML stays.
    pub async fn convert_to_html(&self, xml_path: &Path, domain: &str) -> ConvertOutcome {
        let html_path = xml_path.with_extension("html");

        for strategy in Strategy::CHAIN {
            if !strategy.available() {
                debug!("Converter {} unavailable, skipping", strategy.name());
                continue;
            }

            match self.run(strategy, xml_path, &html_path, domain).await {
                Ok(()) => {
                    info!(
                        "Converted {} to HTML via {}",
                        xml_path.display(),
                        strategy.name()
                    );
                    return ConvertOutcome::Converted(strategy.name());
                }
                Err(reason) => {
                    warn!("{} conversion failed: {}", strategy.name(), reason);
                }
            }
        }

        ConvertOutcome::Unavailable
    }

    async fn run(
        &self,
        strategy: Strategy,
        xml_path: &Path,
        html_path: &Path,
        domain: &str,
    ) -> std::result::Result<(), String> {
        match strategy {
            Strategy::Xalan => {
                let jar = self.reports_dir.join("xalan.jar");
                let args = vec![
                    "-jar".to_string(),
                    jar.to_string_lossy().to_string(),
                    "-IN".to_string(),
                    xml_path.to_string_lossy().to_string(),
                    "-OUT".to_string(),
                    html_path.to_string_lossy().to_string(),
                ];

                let result = executor::execute("java", &args, DEFAULT_TIMEOUT).await;
                if result.is_success() {
                    Ok(())
                } else {
                    Err(result.diagnostic())
                }
            }
            Strategy::Xsltproc => {
                let stylesheet = self.reports_dir.join("nmap.xsl");
                let args = vec![
                    stylesheet.to_string_lossy().to_string(),
                    xml_path.to_string_lossy().to_string(),
                ];

                let result = executor::execute("xsltproc", &args, DEFAULT_TIMEOUT).await;
                if result.is_success() {
                    tokio::fs::write(html_path, &result.stdout)
                        .await
                        .map_err(|e| e.to_string())
                } else {
                    Err(result.diagnostic())
                }
            }
            Strategy::Builtin => {
                let xml = tokio::fs::read_to_string(xml_path)
                    .await
                    .map_err(|e| e.to_string())?;
                let ports = parse_ports(&xml).map_err(|e| e.to_string())?;
                let html = render_minimal_html(domain, &ports);
                tokio::fs::write(html_path, html)
                    .await
                    .map_err(|e| e.to_string())
            }
        }
    }
}

/// One `<port>` element pulled out of scanner XML.
#[derive(Debug, Clone, Default)]
pub struct PortEntry {
    pub port_id: String,
    pub protocol: String,
    pub state: String,
    pub service: Option<String>,
    pub version: Option<String>,
}

/// Extract host/port/state/service structure from scanner XML. Unknown
/// elements are ignored; a malformed document is an error the caller turns
/// into a conversion failure, never a panic.
pub fn parse_ports(xml: &str) -> Result<Vec<PortEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut ports = Vec::new();
    let mut current: Option<PortEntry> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| ScanError::Xml(e.to_string()))?;

        match event {
            Event::Start(ref element) | Event::Empty(ref element) => {
                let empty = matches!(&event, Event::Empty(_));

                match element.name() {
                    QName(b"port") => {
                        let mut entry = PortEntry::default();
                        for attr in element.attributes().flatten() {
                            let value = String::from_utf8_lossy(&attr.value).to_string();
                            match attr.key.as_ref() {
                                b"portid" => entry.port_id = value,
                                b"protocol" => entry.protocol = value,
                                _ => {}
                            }
                        }
                        if empty {
                            ports.push(entry);
                        } else {
                            current = Some(entry);
                        }
                    }
                    QName(b"state") => {
                        if let Some(port) = current.as_mut() {
                            for attr in element.attributes().flatten() {
                                if attr.key.as_ref() == b"state" {
                                    port.state =
                                        String::from_utf8_lossy(&attr.value).to_string();
                                }
                            }
                        }
                    }
                    QName(b"service") => {
                        if let Some(port) = current.as_mut() {
                            for attr in element.attributes().flatten() {
                                let value = String::from_utf8_lossy(&attr.value).to_string();
                                match attr.key.as_ref() {
                                    b"name" => port.service = Some(value),
                                    b"version" => port.version = Some(value),
                                    _ => {}
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::End(element) => {
                if element.name() == QName(b"port") {
                    if let Some(port) = current.take() {
                        ports.push(port);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(ports)
}

/// Self-contained fallback report: one block per port, open/closed styling,
/// service name and version inlined when present.
pub fn render_minimal_html(domain: &str, ports: &[PortEntry]) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str(&format!("<title>Scan Results - {}</title>\n", domain));
    html.push_str("<style>\n");
    html.push_str("body { font-family: Arial, sans-serif; margin: 20px; }\n");
    html.push_str(".header { background-color: #f0f0f0; padding: 10px; border-radius: 5px; }\n");
    html.push_str(".port { margin: 10px 0; padding: 10px; border: 1px solid #ddd; border-radius: 5px; }\n");
    html.push_str(".open { background-color: #d4edda; }\n");
    html.push_str(".closed { background-color: #f8d7da; }\n");
    html.push_str("</style>\n</head>\n<body>\n");

    html.push_str("<div class=\"header\">\n");
    html.push_str("<h1>Scan Results</h1>\n");
    html.push_str(&format!("<p><strong>Target:</strong> {}</p>\n", domain));
    html.push_str(&format!(
        "<p><strong>Scan Date:</strong> {}</p>\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    html.push_str("</div>\n");

    for port in ports {
        let css_class = if port.state == "open" { "open" } else { "closed" };

        html.push_str(&format!("<div class=\"port {}\">\n", css_class));
        html.push_str(&format!(
            "<h3>Port {}/{}</h3>\n",
            port.port_id, port.protocol
        ));
        html.push_str(&format!("<p><strong>State:</strong> {}</p>\n", port.state));
        html.push_str(&format!(
            "<p><strong>Service:</strong> {}</p>\n",
            port.service.as_deref().unwrap_or("Unknown")
        ));
        if let Some(version) = &port.version {
            html.push_str(&format!("<p><strong>Version:</strong> {}</p>\n", version));
        }
        html.push_str("</div>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_XML: &str = r#"<?xml version="1.0"?>
<nmaprun>
  <host>
    <address addr="93.184.216.34" addrtype="ipv4"/>
    <ports>
      <port protocol="tcp" portid="443">
        <state state="open" reason="syn-ack"/>
        <service name="https" version="nginx 1.19"/>
      </port>
      <port protocol="tcp" portid="80">
        <state state="closed" reason="reset"/>
      </port>
    </ports>
  </host>
</nmaprun>"#;

    #[test]
    fn parses_ports_with_state_and_service() {
        let ports = parse_ports(SAMPLE_XML).unwrap();
        assert_eq!(ports.len(), 2);

        assert_eq!(ports[0].port_id, "443");
        assert_eq!(ports[0].protocol, "tcp");
        assert_eq!(ports[0].state, "open");
        assert_eq!(ports[0].service.as_deref(), Some("https"));
        assert_eq!(ports[0].version.as_deref(), Some("nginx 1.19"));

        assert_eq!(ports[1].port_id, "80");
        assert_eq!(ports[1].state, "closed");
        assert_eq!(ports[1].service, None);
    }

    #[test]
    fn zero_ports_still_renders_valid_document() {
        let ports = parse_ports("<?xml version=\"1.0\"?>\n<nmaprun><host/></nmaprun>").unwrap();
        assert!(ports.is_empty());

        let html = render_minimal_html("example.com", &ports);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<div class=\"header\">"));
        assert!(html.contains("example.com"));
        assert!(html.trim_end().ends_with("</html>"));
        assert!(!html.contains("<div class=\"port"));
    }

    #[test]
    fn open_and_closed_ports_get_style_classes() {
        let ports = parse_ports(SAMPLE_XML).unwrap();
        let html = render_minimal_html("example.com", &ports);

        assert!(html.contains("<div class=\"port open\">"));
        assert!(html.contains("<div class=\"port closed\">"));
        assert!(html.contains("Port 443/tcp"));
        assert!(html.contains("nginx 1.19"));
    }

    #[test]
    fn malformed_xml_is_an_error_not_a_panic() {
        assert!(matches!(
            parse_ports("<nmaprun><port></nmaprun>"),
            Err(ScanError::Xml(_))
        ));
    }
}
