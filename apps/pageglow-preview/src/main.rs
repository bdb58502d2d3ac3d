mod app;
mod source;

use eframe::egui;
use pg_behaviors::BehaviorConfig;
use pg_behaviors::PageSession;
use pg_host::Capabilities;
use pg_host::PageOptions;
use std::path::PathBuf;

const DEMO_PAGE: &str = include_str!("demo.html");
const DEMO_URL: &str = "http://localhost/demo.html";

#[derive(Debug, Clone, PartialEq, Eq)]
struct PreviewArgs {
    config: Option<PathBuf>,
    native_lazy_loading: bool,
    page: Option<PathBuf>,
}

fn main() -> Result<(), eframe::Error> {
    install_tracing();

    let args = match preview_args_from(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(error) => {
            eprintln!("PageGlow startup error: {error}");
            eprintln!("usage: pageglow-preview [--config <path>] [--no-native-lazy] [page.html]");
            return Ok(());
        }
    };
    let session = match build_session(&args) {
        Ok(session) => session,
        Err(error) => {
            tracing::error!(%error, "failed to open page");
            eprintln!("PageGlow startup error: {error}");
            return Ok(());
        }
    };

    let title = match session.page().document.title() {
        "" => "PageGlow Preview".to_owned(),
        title => format!("{title} - PageGlow Preview"),
    };
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title)
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        "PageGlow Preview",
        native_options,
        Box::new(|_cc| Ok(Box::new(app::PreviewApp::new(session)))),
    )
}

fn install_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn preview_args_from(args: impl IntoIterator<Item = String>) -> Result<PreviewArgs, String> {
    let mut parsed = PreviewArgs {
        config: None,
        native_lazy_loading: true,
        page: None,
    };

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| "missing path after --config".to_owned())?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--no-native-lazy" => parsed.native_lazy_loading = false,
            flag if flag.starts_with("--") => {
                return Err(format!("unsupported option `{flag}`"));
            }
            page => {
                if parsed.page.is_some() {
                    return Err(format!("unexpected extra page argument `{page}`"));
                }
                parsed.page = Some(PathBuf::from(page));
            }
        }
    }

    Ok(parsed)
}

fn build_session(args: &PreviewArgs) -> Result<PageSession, String> {
    let config = match &args.config {
        Some(path) => BehaviorConfig::load(path).map_err(|error| error.to_string())?,
        None => BehaviorConfig::default(),
    };

    let (markup, url) = match &args.page {
        Some(path) => {
            let source = source::read_page(path)?;
            (source.markup, source.url)
        }
        None => (DEMO_PAGE.to_owned(), DEMO_URL.to_owned()),
    };

    let options = PageOptions {
        url,
        capabilities: Capabilities {
            native_lazy_loading: args.native_lazy_loading,
        },
        ..PageOptions::default()
    };
    let mut session =
        PageSession::load(&markup, options, config).map_err(|error| error.to_string())?;
    session
        .dom_content_loaded()
        .map_err(|error| error.to_string())?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::PreviewArgs;
    use super::build_session;
    use super::preview_args_from;
    use std::io::Write;
    use std::path::PathBuf;

    fn args(values: &[&str]) -> Result<PreviewArgs, String> {
        preview_args_from(values.iter().map(|value| (*value).to_owned()))
    }

    #[test]
    fn parses_flags_in_any_order() {
        let parsed = args(&["site/index.html", "--no-native-lazy", "--config", "glow.toml"]);
        assert_eq!(
            parsed,
            Ok(PreviewArgs {
                config: Some(PathBuf::from("glow.toml")),
                native_lazy_loading: false,
                page: Some(PathBuf::from("site/index.html")),
            })
        );
    }

    #[test]
    fn defaults_to_the_demo_page_with_native_lazy_loading() {
        let parsed = args(&[]);
        assert_eq!(parsed.as_ref().map(|args| args.native_lazy_loading), Ok(true));
        assert_eq!(parsed.map(|args| args.page), Ok(None));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--verbose"]).is_err());
        assert!(args(&["a.html", "b.html"]).is_err());
    }

    #[test]
    fn demo_page_installs_every_behavior() {
        let parsed = match args(&[]) {
            Ok(parsed) => parsed,
            Err(error) => panic!("{error}"),
        };
        let session = match build_session(&parsed) {
            Ok(session) => session,
            Err(error) => panic!("{error}"),
        };
        let behaviors = session.behaviors();
        assert!(behaviors.is_installed());
        assert!(behaviors.mobile_nav().is_some());
        assert!(behaviors.header().is_some());
        assert!(behaviors.scroll_spy().is_some_and(|spy| !spy.sections().is_empty()));
        assert!(behaviors.timeline().is_some_and(|timeline| !timeline.containers().is_empty()));
    }

    #[test]
    fn config_errors_surface_at_startup() {
        let mut file = match tempfile::NamedTempFile::new() {
            Ok(file) => file,
            Err(error) => panic!("{error}"),
        };
        if let Err(error) = writeln!(file, "[reveal]\nthreshold = 2.0") {
            panic!("{error}");
        }
        let parsed = PreviewArgs {
            config: Some(file.path().to_path_buf()),
            native_lazy_loading: true,
            page: None,
        };
        assert!(build_session(&parsed).is_err());
    }
}
