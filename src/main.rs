use clap::{Parser, Subcommand};
use hcp1_uap1::{
    init_logger, log_error, log_info, Config, DoorState, Hcp1Client, LiveBusPeer, TargetDoorState,
};

#[derive(Parser)]
#[command(name = "hcp1-cli")]
#[command(about = "CLI tool for impersonating a UAP1 accessory module on a Hörmann HCP1 bus")]
struct Cli {
    /// Serial device path, e.g. /dev/ttyUSB0.
    #[arg(long, global = true)]
    path: Option<String>,

    #[arg(long, global = true, default_value_t = 19_200)]
    baud_rate: u32,

    #[arg(long, global = true, default_value_t = 50)]
    packet_timeout_ms: u64,

    #[arg(long, global = true, default_value = "Hörmann Garage Door")]
    door_name: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Request the door open.
    Open,
    /// Request the door closed.
    Close,
    /// Request venting position.
    Vent,
    /// Emergency stop.
    Stop,
    /// Turn the light on.
    LightOn,
    /// Turn the light off.
    LightOff,
    /// Print the current door and light state once the first broadcast arrives.
    Status,
    /// Print door and light state changes as they arrive.
    Monitor,
}

#[tokio::main]
async fn main() -> Result<(), hcp1_uap1::HcpError> {
    init_logger();

    let cli = Cli::parse();
    let path = cli.path.ok_or(hcp1_uap1::HcpError::MissingPath)?;
    let config = Config::builder()
        .path(path)
        .baud_rate(cli.baud_rate)
        .packet_timeout_ms(cli.packet_timeout_ms)
        .door_name(cli.door_name)
        .build()?;

    let peer = LiveBusPeer::connect(&config).await?;
    let mut client = Hcp1Client::new(peer.clone());

    client.on_error(|err| log_error(&format!("{err}")));

    let run_handle = tokio::spawn(std::sync::Arc::new(peer).run());

    match cli.command {
        Commands::Open => {
            client.set_target_state(TargetDoorState::Open).await?;
            log_info("requested: open");
        }
        Commands::Close => {
            client.set_target_state(TargetDoorState::Closed).await?;
            log_info("requested: close");
        }
        Commands::Vent => {
            client.set_target_state(TargetDoorState::Venting).await?;
            log_info("requested: vent");
        }
        Commands::Stop => {
            client.emergency_stop().await?;
            log_info("requested: emergency stop");
        }
        Commands::LightOn => {
            client.set_light_on_state(true).await?;
            log_info("requested: light on");
        }
        Commands::LightOff => {
            client.set_light_on_state(false).await?;
            log_info("requested: light off");
        }
        Commands::Status => {
            wait_for_first_status(&client).await;
        }
        Commands::Monitor => {
            client.on_update_door(|state| log_info(&format!("door: {state:?}")));
            client.on_update_light(|on| log_info(&format!("light: {}", if on { "on" } else { "off" })));
            let _ = run_handle.await;
        }
    }

    Ok(())
}

async fn wait_for_first_status(client: &Hcp1Client<LiveBusPeer>) {
    loop {
        if let Ok(state) = client.get_current_state() {
            print_status(state, client.get_light_on_state().ok());
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}

fn print_status(state: DoorState, light_on: Option<bool>) {
    log_info(&format!(
        "door: {state:?}, light: {}",
        match light_on {
            Some(true) => "on",
            Some(false) => "off",
            None => "unknown",
        }
    ));
}
