use criterion::{Criterion, criterion_group, criterion_main};
use ldappool::{BindError, BindIdentity, ConnectError, LdapConnection, LdapPool, PoolConfig};

struct NullConn {
    alive: bool,
}

impl LdapConnection for NullConn {
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

fn bench_pool(c: &mut Criterion) {
    let pool = LdapPool::new(
        PoolConfig::new("localhost", 389)
            .with_max_conns(4)
            .with_max_shared_conns(8),
        || NullConn { alive: false },
    )
    .unwrap();
    let admin = BindIdentity::new("cn=admin,dc=example,dc=com", b"secret");

    // Prime one group so the warm path is exercised, not the first bind.
    drop(pool.acquire(&admin).unwrap());

    c.bench_function("acquire_release_warm", |b| {
        b.iter(|| {
            let handle = pool.acquire(&admin).unwrap().unwrap();
            drop(handle);
        })
    });

    c.bench_function("acquire_release_fast_path", |b| {
        let _held = pool.acquire(&admin).unwrap().unwrap();
        b.iter(|| {
            let handle = pool.acquire(&admin).unwrap().unwrap();
            drop(handle);
        })
    });
}

criterion_group!(benches, bench_pool);
criterion_main!(benches);
