use anyhow::Result;

fn main() -> Result<()> {
    structgraph_cli::main_entry()
}
