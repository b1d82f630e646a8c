//! Batched divider advancement
//!
//! The channel timers are down-counting dividers clocked at the chip rate.
//! Advancing them one cycle at a time would dominate the synthesis cost, so
//! these helpers advance a counter by an arbitrary cycle count in O(1) and
//! report how many times it wrapped.
//!
//! Both helpers require the counter to start inside `[0, period)`; the
//! closed form is exact only under that invariant.

/// Advance a down-counting divider by `cycles`, returning the wrap count.
///
/// The counter counts `period-1, .., 1, 0, period-1, ..`; each pass through
/// zero is one wrap.
#[inline]
pub fn count_down(counter: &mut u32, period: u32, cycles: u32) -> u32 {
    debug_assert!(period > 0, "count_down with zero period");
    debug_assert!(*counter < period, "counter must start below period");

    let mut wraps = cycles / period;
    let extra = cycles % period;
    if extra > *counter {
        *counter += period - extra;
        wraps += 1;
    } else {
        *counter -= extra;
    }
    wraps
}

/// Advance an up-counting divider by `cycles`, returning the wrap count.
///
/// The counter counts `0, 1, .., period-1, 0, ..`; used by the triangle's
/// ascending sequencer index.
#[inline]
pub fn count_up(counter: &mut u32, period: u32, cycles: u32) -> u32 {
    debug_assert!(period > 0, "count_up with zero period");
    debug_assert!(*counter < period, "counter must start below period");

    let mut wraps = cycles / period;
    let extra = cycles % period;
    *counter += extra;
    if *counter >= period {
        *counter -= period;
        wraps += 1;
    }
    wraps
}
