fn main() -> anyhow::Result<()> {
    beanscope_cli::run()
}
