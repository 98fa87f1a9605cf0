use anyhow::Context;
use chirp::socket::{Addr, Listener};
use diesel::r2d2::ConnectionManager;

use crate::common::{quit_signal, RmGuard};

#[derive(structopt::StructOpt)]
pub struct Opt {
    #[structopt(long = "bind", help = "Address to listen on (overrides the manifest)")]
    bind: Option<Addr>,
}

pub async fn main(opt: &crate::Opt, subopt: Opt) -> anyhow::Result<()> {
    let manifest = opt.open_manifest()?;

    let addr = subopt.bind.unwrap_or_else(|| manifest.bind());

    let manager = ConnectionManager::new(manifest.database_url());
    let pool = chirp::private::util::r2d2::new_pool(manager)
        .context("failed to initialize the connection pool")?;
    {
        let conn = pool.get()?;
        chirp::migrations::run(&*conn).context("migration failed")?;
    }

    let listener = Listener::bind(&addr).with_context(|| format!("failed to bind {}", addr))?;
    let _rm_guard = match addr {
        Addr::Unix(ref path) => Some(RmGuard(path.clone())),
        Addr::Tcp(_) => None,
    };
    info!("Listening on {}", listener.local_addr().unwrap_or(addr));

    let shutdown = quit_signal().context("failed to install signal handlers")?;
    chirp::api::serve(listener, pool, shutdown)
        .await
        .context("server error")?;

    info!("Shut down gracefully");
    Ok(())
}
