pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# SLOW-COLLECTOR CONFIGURATION
# =============================================================================
# Settings for one-shot collection runs. Command-line flags take precedence
# over this file. References of the form $env{...} are replaced with
# environment values before parsing.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/slow-collector/config.yml
#   3. /etc/slow-collector/config.yml

aws:
  # Falls back to AWS_REGION, then AWS_DEFAULT_REGION, when left empty
  region:

# Restrict collection to the members of these clusters. Leave empty to
# collect from every instance in the region.
clusters: []

# Last-written bounds of the log files to collect, UTC, YYYY-MM-DDTHH:MM:SS.
# Defaults to the 24 hours before the run starts.
window:
  start:
  end:

# One file per instance and run: <dir>/<instance>/<YYYYMMDDHHMM>.log
sink:
  type: local
  dir: ~/slowlogs
"#
    .to_string()
}
