//! Async usage examples

use ldappool::{BindError, BindIdentity, ConnectError, LdapConnection, LdapPool, PoolConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

struct DemoConn {
    alive: bool,
}

impl LdapConnection for DemoConn {
    fn connect(&mut self, _host: &str, _port: u16) -> Result<(), ConnectError> {
        self.alive = true;
        Ok(())
    }

    fn upgrade_transport(&mut self) -> Result<(), ConnectError> {
        Ok(())
    }

    fn bind(
        &mut self,
        _version: u8,
        _principal: Option<&str>,
        _secret: Option<&[u8]>,
    ) -> Result<(), BindError> {
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.alive
    }
}

fn demo_pool(max_conns: usize, fan_out: usize, timeout: Duration) -> LdapPool<DemoConn> {
    LdapPool::new(
        PoolConfig::new("ldap.example.com", 389)
            .with_max_conns(max_conns)
            .with_max_shared_conns(fan_out)
            .with_timeout(timeout),
        || DemoConn { alive: false },
    )
    .unwrap()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    println!("=== ldappool - Async Examples ===\n");

    // Example 1: Async acquire
    async_acquire().await;

    // Example 2: Async with timeout
    async_with_timeout().await;

    // Example 3: Concurrent access
    concurrent_access().await;
}

async fn async_acquire() {
    println!("1. Async Acquire:");
    let pool = demo_pool(2, 2, Duration::from_secs(5));
    let admin = BindIdentity::new("cn=admin,dc=example,dc=com", b"secret");

    {
        let handle = pool.acquire_async(&admin).await.unwrap().unwrap();
        println!("   Got handle {} asynchronously", handle.id());
    }

    println!();
}

async fn async_with_timeout() {
    println!("2. Async with Timeout:");
    let pool = demo_pool(1, 1, Duration::from_millis(100));
    let admin = BindIdentity::new("cn=admin,dc=example,dc=com", b"secret");

    // Hold the only handle.
    let _held = pool.acquire(&admin).unwrap().unwrap();

    match pool.acquire_async(&admin).await {
        Ok(_) => println!("   Got handle"),
        Err(e) => println!("   Error: {}", e),
    }

    println!();
}

async fn concurrent_access() {
    println!("3. Concurrent Access:");
    let pool = Arc::new(demo_pool(2, 2, Duration::from_secs(5)));
    let admin = BindIdentity::new("cn=admin,dc=example,dc=com", b"secret");

    let mut tasks = vec![];

    for i in 0..6 {
        let pool = Arc::clone(&pool);
        let admin = admin.clone();
        tasks.push(tokio::spawn(async move {
            match pool.acquire_async(&admin).await {
                Ok(Some(handle)) => {
                    println!("   Task {} got handle {}", i, handle.id());
                    sleep(Duration::from_millis(50)).await;
                }
                Ok(None) => println!("   Task {}: pool shutting down", i),
                Err(e) => println!("   Task {}: {}", i, e),
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    println!("   Final available groups: {}", pool.available_groups());
    pool.shutdown();
}
