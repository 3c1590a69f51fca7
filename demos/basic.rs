//! Basic usage examples for the LDAP connection pool

use ldappool::{BindError, BindIdentity, ConnectError, LdapConnection, LdapPool, PoolConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory stand-in for a real protocol session.
struct DemoConn {
    alive: bool,
    binds: Arc<AtomicUsize>,
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
        self.binds.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.alive
    }
}

fn demo_pool(max_conns: usize, fan_out: usize) -> (LdapPool<DemoConn>, Arc<AtomicUsize>) {
    let binds = Arc::new(AtomicUsize::new(0));
    let pool = {
        let binds = Arc::clone(&binds);
        LdapPool::new(
            PoolConfig::new("ldap.example.com", 389)
                .with_max_conns(max_conns)
                .with_max_shared_conns(fan_out),
            move || DemoConn {
                alive: false,
                binds: Arc::clone(&binds),
            },
        )
        .unwrap()
    };
    (pool, binds)
}

fn main() {
    println!("=== ldappool - Basic Examples ===\n");

    // Example 1: Acquire and automatic release
    simple_acquire();

    // Example 2: Credential-aware reuse
    credential_reuse();

    // Example 3: Try methods
    try_methods();

    // Example 4: Metrics and health
    metrics_and_health();
}

fn simple_acquire() {
    println!("1. Acquire and Release:");
    let (pool, _) = demo_pool(2, 2);
    let admin = BindIdentity::new("cn=admin,dc=example,dc=com", b"secret");

    {
        let handle = pool.acquire(&admin).unwrap().unwrap();
        println!("   Got handle {} bound as admin", handle.id());
        // Handle automatically returned when dropped
    }

    println!("   Available groups after return: {}\n", pool.available_groups());
}

fn credential_reuse() {
    println!("2. Credential-Aware Reuse:");
    let (pool, binds) = demo_pool(2, 2);
    let admin = BindIdentity::new("cn=admin,dc=example,dc=com", b"secret");

    let first = pool.acquire(&admin).unwrap().unwrap();
    println!("   Binds after first acquire: {}", binds.load(Ordering::Relaxed));

    // Same identity: shares the already-bound session, no second bind.
    let second = pool.acquire(&admin).unwrap().unwrap();
    println!("   Binds after second acquire: {}", binds.load(Ordering::Relaxed));
    println!(
        "   Handles {} and {} share one authenticated socket\n",
        first.id(),
        second.id()
    );
}

fn try_methods() {
    println!("3. Try Methods:");
    let (pool, _) = demo_pool(1, 1);
    let admin = BindIdentity::new("cn=admin,dc=example,dc=com", b"secret");

    let held = pool.try_acquire(&admin).unwrap();
    assert!(held.is_some());
    println!("   First try: Success");

    // The only handle is checked out.
    let second = pool.try_acquire(&admin).unwrap();
    assert!(second.is_none());
    println!("   Second try: None (pool exhausted)");

    drop(held);

    let third = pool.try_acquire(&admin).unwrap();
    assert!(third.is_some());
    println!("   Third try: Success\n");
}

fn metrics_and_health() {
    println!("4. Metrics and Health:");
    let (pool, _) = demo_pool(2, 4);
    let admin = BindIdentity::new("cn=admin,dc=example,dc=com", b"secret");

    {
        let _h1 = pool.acquire(&admin).unwrap().unwrap();
        let _h2 = pool.acquire(&admin).unwrap().unwrap();

        let health = pool.get_health_status();
        println!(
            "   Health: {}",
            if health.is_healthy() { "Healthy" } else { "Unhealthy" }
        );
        println!("   Utilization: {:.1}%", health.utilization * 100.0);
        println!(
            "   Checked out: {}, Available groups: {}",
            health.checked_out_handles, health.available_groups
        );
    }

    println!("\n   Metrics:");
    for (key, value) in pool.export_metrics() {
        println!("     {}: {}", key, value);
    }
}
