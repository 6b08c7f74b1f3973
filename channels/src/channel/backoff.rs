use std::thread;
use std::time::Instant;

/// Emits a CPU instruction that signals the processor that it is in a spin loop.
#[inline(always)]
fn spin_hint() {
  std::hint::spin_loop();
}

/// Waits for `cond` with an adaptive strategy: spin, then yield, then park.
///
/// With a deadline the parking phase uses `park_timeout`. Returns `true` if
/// `cond` became true, `false` if the deadline passed first.
pub(crate) fn adaptive_wait<F>(cond: F, deadline: Option<Instant>) -> bool
where
  F: Fn() -> bool,
{
  // 1. Spinning Phase
  for _ in 0..10 {
    if cond() {
      return true;
    }
    spin_hint();
  }

  // 2. Yielding Phase
  for _ in 0..20 {
    if cond() {
      return true;
    }
    thread::yield_now();
  }

  // 3. Blocking Phase. Spurious unparks loop back to the condition check.
  loop {
    if cond() {
      return true;
    }
    match deadline {
      None => thread::park(),
      Some(deadline) => {
        let now = Instant::now();
        if now >= deadline {
          return cond();
        }
        thread::park_timeout(deadline - now);
      }
    }
  }
}
