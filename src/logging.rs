use fern::colors::{Color, ColoredLevelConfig};

/// wire logging up to stderr; stdout belongs to the terminal display
pub fn setup_logger(verbosity: u8, quiet_cycles: bool) -> Result<(), fern::InitError> {
    let mut config = fern::Dispatch::new();
    config = match verbosity {
        0 => config.level(log::LevelFilter::Error),
        1 => config.level(log::LevelFilter::Warn),
        2 => config.level(log::LevelFilter::Info),
        3 => config.level(log::LevelFilter::Debug),
        _ => config.level(log::LevelFilter::Trace),
    };
    if quiet_cycles {
        // the per-cycle trace drowns everything else out at full verbosity
        config = config.level_for("vip8::interpreter", log::LevelFilter::Off);
    }

    let colors_line = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Cyan)
        .debug(Color::Green)
        .trace(Color::Magenta);

    config
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{color_line}[{target}:{level}] {message}\x1B[0m",
                color_line = format_args!(
                    "\x1B[{}m",
                    colors_line.get_color(&record.level()).to_fg_str()
                ),
                target = record.target(),
                level = record.level(),
                message = message
            ));
        })
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}
