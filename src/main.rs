fn main() -> anyhow::Result<()> {
    postcraft_lib::run()
}
