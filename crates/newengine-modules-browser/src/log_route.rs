use log::Level;

/// Target every forwarded native line is logged under.
pub const NATIVE_LOG_TARGET: &str = "native";

const PREFIXES: [(&str, Level); 4] = [
    ("[error]", Level::Error),
    ("[warning]", Level::Warn),
    ("[debug]", Level::Debug),
    ("[info]", Level::Info),
];

/// Strips one trailing line terminator and picks the level from the prefix.
/// Unprefixed lines are `Info`. The prefix is kept in the message.
pub fn classify_native_line(line: &str) -> (Level, &str) {
    let line = line
        .strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .unwrap_or(line);

    let level = PREFIXES
        .iter()
        .find(|(prefix, _)| line.starts_with(prefix))
        .map_or(Level::Info, |(_, level)| *level);

    (level, line)
}

pub fn route_native_line(line: &str) {
    let (level, msg) = classify_native_line(line);
    log::log!(target: NATIVE_LOG_TARGET, level, "{msg}");
}
