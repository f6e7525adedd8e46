//! 整序列批处理与代表性切片推荐入口.

mod result;
mod runner;

fn main() {
    simple_logger::init_with_level(log::Level::Info).expect("Logger init error");

    let result = runner::run();
    result.analyze();
}
