// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;
use std::rc::Rc;

use arcol_engine::run_simulation;
use arcol_engine::test_helpers::start_test;

#[test]
fn time_advances_to_last_wait() {
    let mut engine = start_test(file!());
    let clock = engine.default_clock();

    engine.spawn(async move {
        clock.wait_ticks(10).await;
        clock.wait_ticks(5).await;
        Ok(())
    });
    run_simulation!(engine);
    assert_eq!(engine.time_now_ns(), 15.0);
}

#[test]
fn tasks_woken_in_time_order() {
    let mut engine = start_test(file!());
    let order = Rc::new(RefCell::new(Vec::new()));

    for (name, ticks) in [("slow", 30), ("fast", 10), ("middle", 20)] {
        let clock = engine.default_clock();
        let order = order.clone();
        engine.spawn(async move {
            clock.wait_ticks(ticks).await;
            order.borrow_mut().push((name, clock.tick_now()));
            Ok(())
        });
    }
    run_simulation!(engine);
    assert_eq!(
        *order.borrow(),
        vec![("fast", 10), ("middle", 20), ("slow", 30)]
    );
}

#[test]
fn two_clock_frequencies() {
    let mut engine = start_test(file!());
    let fast = engine.default_clock();
    let slow = engine.clock_mhz(500.0);
    let order = Rc::new(RefCell::new(Vec::new()));

    {
        let order = order.clone();
        engine.spawn(async move {
            // 3 ticks at 500MHz is 6ns
            slow.wait_ticks(3).await;
            order.borrow_mut().push("slow");
            Ok(())
        });
    }
    {
        let order = order.clone();
        engine.spawn(async move {
            fast.wait_ticks(5).await;
            order.borrow_mut().push("fast");
            Ok(())
        });
    }
    run_simulation!(engine);
    assert_eq!(*order.borrow(), vec!["fast", "slow"]);
    assert_eq!(engine.time_now_ns(), 6.0);
}
