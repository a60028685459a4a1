use std::process::ExitStatus;

error_chain! {
    links {
        Vcov(::vcov::error::Error, ::vcov::error::ErrorKind);
    }

    foreign_links {
        TomlDe(::toml::de::Error);
        Io(::std::io::Error);
    }

    errors {
        NoPhases {
            description("no coverage data files given")
            display("no coverage data files given, pass them as arguments or list them as [[phase]] in --config")
        }

        ToolFailed(tool: String, status: ExitStatus, stderr: String) {
            description("external tool failed")
            display("{} exited with status {}: {}", tool, status, stderr.trim())
        }
    }
}
