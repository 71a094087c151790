//! Thread lifecycle, sleeping and semaphores across threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use compat_threads::sem::{Sem, SemError};
use compat_threads::{
    thrd_create, thrd_current, thrd_equal, thrd_exit, thrd_join, thrd_sleep, thrd_yield,
    timespec_get, Thrd, ThrdError, Timespec, THRD_SUCCESS, TIME_UTC,
};

#[test]
fn test_many_threads_report_their_codes() {
    let handles: Vec<_> = (0..8)
        .map(|n| {
            Thrd::create(move || {
                if n % 2 == 0 {
                    thrd_exit(n * 10);
                }
                n
            })
            .unwrap()
        })
        .collect();

    let codes: Vec<i32> = handles.into_iter().map(|t| t.join().unwrap()).collect();
    assert_eq!(codes, vec![0, 1, 20, 3, 40, 5, 60, 7]);
}

#[test]
fn test_c_shaped_lifecycle() {
    let mut thr = None;
    assert_eq!(
        thrd_create(&mut thr, || {
            thrd_yield();
            let me = thrd_current();
            assert!(thrd_equal(me, thrd_current()));
            5
        }),
        THRD_SUCCESS
    );
    let mut code = 0;
    assert_eq!(thrd_join(thr.unwrap(), Some(&mut code)), THRD_SUCCESS);
    assert_eq!(code, 5);
}

#[test]
fn test_panicking_thread_joins_with_error() {
    let thr = Thrd::create(|| panic!("boom")).unwrap();
    assert_eq!(thr.join(), Err(ThrdError::Error));
}

#[test]
fn test_sleep_duration() {
    let start = Instant::now();
    assert_eq!(thrd_sleep(&Timespec::new(0, 50_000_000), None), 0);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(50), "woke early: {:?}", elapsed);
}

#[test]
fn test_wall_clock_advances_across_sleep() {
    let mut before = Timespec::default();
    let mut after = Timespec::default();
    assert_eq!(timespec_get(&mut before, TIME_UTC), TIME_UTC);
    thrd_sleep(&Timespec::new(0, 20_000_000), None);
    assert_eq!(timespec_get(&mut after, TIME_UTC), TIME_UTC);
    assert!(after > before);
}

#[test]
fn test_semaphore_hands_out_posts_once() {
    const WORKERS: usize = 4;
    const POSTS: usize = 40;
    let sem = Arc::new(Sem::init(false, 0).unwrap());
    let taken = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let sem = Arc::clone(&sem);
            let taken = Arc::clone(&taken);
            Thrd::create(move || {
                let mut mine = 0;
                loop {
                    let deadline = Timespec::after(Duration::from_millis(200));
                    match sem.timedwait(&deadline) {
                        Ok(()) => {
                            taken.fetch_add(1, Ordering::SeqCst);
                            mine += 1;
                        }
                        Err(SemError::TimedOut) => return mine,
                        Err(err) => panic!("unexpected {:?}", err),
                    }
                }
            })
            .unwrap()
        })
        .collect();

    for _ in 0..POSTS {
        sem.post().unwrap();
    }
    let total: i32 = handles.into_iter().map(|t| t.join().unwrap()).sum();
    assert_eq!(total as usize, POSTS);
    assert_eq!(taken.load(Ordering::SeqCst), POSTS);
    assert_eq!(sem.getvalue().unwrap(), 0);
}
