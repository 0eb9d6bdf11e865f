use rand::distributions::{Distribution, Uniform};
use rand::{thread_rng, Rng};
use std::collections::HashSet;
use std::net::Ipv4Addr;

/// `count` random addresses. With `distinct`, they are drawn from a pool of
/// exactly that many different addresses, so the output never holds more
/// unique ones than that, and holds all of them once `count` is large enough.
pub fn gen(count: usize, distinct: Option<u32>) -> impl Iterator<Item = Ipv4Addr> {
    let mut rng = thread_rng();
    let pool = distinct.map(|n| pool(n, &mut rng));
    let pick = Uniform::from(0..pool.as_ref().map_or(1, Vec::len));
    (0..count).map(move |_| {
        let key = match &pool {
            Some(pool) => pool[pick.sample(&mut rng)],
            None => rng.gen(),
        };
        Ipv4Addr::from(key)
    })
}

/// `n` different random keys, at least one.
fn pool(n: u32, rng: &mut impl Rng) -> Vec<u32> {
    let n = n.max(1) as usize;
    let mut keys = HashSet::with_capacity(n);
    while keys.len() < n {
        keys.insert(rng.gen::<u32>());
    }
    keys.into_iter().collect()
}
