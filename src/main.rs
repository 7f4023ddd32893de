// SPDX-License-Identifier: MPL-2.0
use iced_preview::app::{self, paths, Flags};
use iced_preview::logging;

const HELP: &str = "\
Usage: iced_preview [OPTIONS] [FILE]

Options:
  --lang <LOCALE>       Interface language (e.g. en-US, fr)
  --config-dir <DIR>    Directory holding settings.toml
  --no-waveform         Hide the audio waveform
  -h, --help            Print this help
";

fn main() -> iced::Result {
    logging::init();

    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let lang = args.opt_value_from_str("--lang").unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring invalid --lang");
        None
    });
    let config_dir: Option<String> = args.opt_value_from_str("--config-dir").unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring invalid --config-dir");
        None
    });
    let no_waveform = args.contains("--no-waveform");
    let file_path = args
        .finish()
        .into_iter()
        .next()
        .and_then(|s| s.into_string().ok());

    paths::init_cli_overrides(config_dir.clone());
    if let Err(e) = iced_preview::media::init_ffmpeg() {
        tracing::error!(error = %e, "video decoding unavailable");
    }

    app::run(Flags {
        lang,
        file_path,
        config_dir,
        no_waveform,
    })
}
