use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("pipebench {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: pipebench");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("PIPEBENCH_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("PIPEBENCH_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!(
        "max_frame_size: {}",
        pipebench_frame::DEFAULT_MAX_PAYLOAD
    );
    println!("features: cli={}", cfg!(feature = "cli"));

    Ok(SUCCESS)
}
